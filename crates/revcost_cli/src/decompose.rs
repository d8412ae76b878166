//! `revcost decompose`: one level of an operation's decomposition.
//!
//! With `--verify`, every input pattern of a concrete operation is pushed
//! through the decomposition by the simulator and compared with the
//! operation's arithmetic. Nodes without direct arithmetic semantics are
//! checked by running them followed by their inverse.

use revcost_common::Bits;
use revcost_decompose::callees;
use revcost_ir::Bloq;
use revcost_sim::{classical_action, SimError, Simulator, Values};

use crate::pipeline::{load_project, select_ops};
use crate::{DecomposeArgs, GlobalArgs};

/// Widest input, in bits, that `--verify` will enumerate.
pub const MAX_VERIFY_BITS: u32 = 16;

/// Runs the `revcost decompose` command.
pub fn run(args: &DecomposeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    let ops = select_ops(&config, std::slice::from_ref(&args.op))?;
    for op in &ops {
        print!("{}", render(&op.name, &op.bloq)?);
        if args.verify {
            let checked = verify(&op.bloq)?;
            if !global.quiet {
                eprintln!("   Verified {} on {checked} input patterns", op.name);
            }
        }
    }
    Ok(0)
}

/// The node's direct callees, one per line.
pub fn render(name: &str, bloq: &Bloq) -> Result<String, Box<dyn std::error::Error>> {
    let children = callees(bloq)?;
    let mut out = format!("{name}: {bloq}\n");
    if children.is_empty() {
        out.push_str("  (elementary)\n");
    }
    for (child, n) in &children.counts {
        out.push_str(&format!("  {child}: {n}\n"));
    }
    if children.upper_bound {
        out.push_str("  (counts are upper bounds)\n");
    }
    Ok(out)
}

/// Checks the decomposition of `bloq` on every input pattern.
///
/// Returns how many patterns were compared. Patterns the operation itself
/// rejects, such as an uncompute whose sum register does not hold `a + b`,
/// are skipped.
pub fn verify(bloq: &Bloq) -> Result<usize, Box<dyn std::error::Error>> {
    let sig = bloq.signature();
    let widths = sig
        .lefts()
        .map(|reg| {
            reg.bitwidth()
                .as_u32()
                .map(|w| (reg.name().to_string(), w))
                .ok_or_else(|| format!("{bloq} has symbolic parameters; bind them to verify"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let total: u32 = widths.iter().map(|(_, w)| w).sum();
    if total > MAX_VERIFY_BITS {
        return Err(format!("{bloq} has {total} input bits; --verify handles at most {MAX_VERIFY_BITS}").into());
    }

    let mut sim = Simulator::new();
    let mut checked = 0;
    for pattern in 0..1u128 << total {
        let inputs = split_pattern(pattern, &widths);
        let expected = match classical_action(bloq, &inputs) {
            Ok(expected) => expected,
            Err(SimError::InconsistentUncompute { .. }) => continue,
            Err(SimError::NoReference { .. }) => {
                check_round_trip(&mut sim, bloq, &inputs)?;
                checked += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let found = sim.run(bloq, &inputs)?;
        if found != expected {
            return Err(format!(
                "{bloq} on {}: expected {}, decomposition gives {}",
                show(&inputs),
                show(&expected),
                show(&found)
            )
            .into());
        }
        checked += 1;
    }
    tracing::debug!(bloq = %bloq, checked, "verified decomposition");
    Ok(checked)
}

fn check_round_trip(sim: &mut Simulator, bloq: &Bloq, inputs: &Values) -> Result<(), Box<dyn std::error::Error>> {
    let inverse = bloq
        .adjoint()
        .ok_or_else(|| format!("{bloq} has neither reference semantics nor an inverse"))?;
    let forward = sim.run(bloq, inputs)?;
    let back = sim.run(&inverse, &forward)?;
    if &back != inputs {
        return Err(format!("{bloq} followed by {inverse} maps {} to {}", show(inputs), show(&back)).into());
    }
    Ok(())
}

/// Slices `pattern` into registers, first register in the low bits.
fn split_pattern(pattern: u128, widths: &[(String, u32)]) -> Values {
    let mut offset = 0;
    widths
        .iter()
        .map(|(name, w)| {
            let value = Bits::from_u128(pattern >> offset, *w);
            offset += w;
            (name.clone(), value)
        })
        .collect()
}

fn show(values: &Values) -> String {
    values
        .iter()
        .map(|(name, v)| format!("{name}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
