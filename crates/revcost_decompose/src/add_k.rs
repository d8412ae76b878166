//! Constant addition: load `k` into an ancilla, add, unload.
//!
//! Only the load and unload see the controls, so a controlled `AddK` costs
//! one uncontrolled `Add` plus cheap controlled bit flips.

use crate::concrete;
use crate::error::{RuleError, RuleResult};
use revcost_ir::{Add, AddK, Bloq, WireId, WiringBuilder, WiringGraph};

/// Bit `i` of the two's-complement pattern of `k`.
pub(crate) fn k_bit(k: i64, i: u32) -> bool {
    (k >> i.min(63)) & 1 == 1
}

/// The node that flips one ancilla bit under the given control values.
pub(crate) fn load_gate(cvs: &[u8]) -> RuleResult<Bloq> {
    Ok(match cvs {
        [] => Bloq::XGate,
        [1] => Bloq::Cnot,
        _ => Bloq::multi_control_x(cvs.to_vec())?,
    })
}

/// Flips every set bit of `k` in `anc`, threading the control wire through.
fn load(bb: &mut WiringBuilder, gate: &Bloq, k: i64, anc: WireId, mut ctrls: Option<WireId>) -> RuleResult<(WireId, Option<WireId>)> {
    let ctrl_register = if *gate == Bloq::Cnot { "ctrl" } else { "ctrls" };
    let mut bits = bb.split(anc)?;
    for (i, bit) in bits.iter_mut().enumerate() {
        if !k_bit(k, i as u32) {
            continue;
        }
        match ctrls {
            None => {
                let [q] = bb.add_n(gate.clone(), &[("q", *bit)])?;
                *bit = q;
            }
            Some(c) => {
                let [c, q] = bb.add_n(gate.clone(), &[(ctrl_register, c), ("target", *bit)])?;
                ctrls = Some(c);
                *bit = q;
            }
        }
    }
    Ok((bb.join(&bits)?, ctrls))
}

pub(crate) fn decompose(add_k: &AddK) -> RuleResult<WiringGraph> {
    let n = concrete(add_k.bitwidth())?;
    let k = add_k.k().as_i64().ok_or(RuleError::Symbolic)?;
    let gate = load_gate(add_k.cvs())?;
    let adder = Bloq::Add(Add::symmetric(n)?.with_signed(add_k.is_signed())?);

    let mut bb = WiringBuilder::new(Bloq::AddK(add_k.clone()).signature())?;
    let ctrls = if add_k.cvs().is_empty() { None } else { Some(bb.input("ctrls")?) };
    let x = bb.input("x")?;
    let anc = bb.allocate(n)?;
    let (anc, ctrls) = load(&mut bb, &gate, k, anc, ctrls)?;
    let [anc, x] = bb.add_n(adder, &[("a", anc), ("b", x)])?;
    let (anc, ctrls) = load(&mut bb, &gate, k, anc, ctrls)?;
    bb.free(anc)?;
    let graph = match ctrls {
        Some(c) => bb.finish_whole(&[("ctrls", c), ("x", x)])?,
        None => bb.finish_whole(&[("x", x)])?,
    };
    Ok(graph)
}
