//! Out-of-place addition and its measurement-based uncomputation.

use crate::circuit::{Program, SlotEmitter};
use crate::concrete;
use crate::error::RuleResult;
use revcost_ir::{Bloq, OutOfPlaceAdder, WiringBuilder, WiringGraph};

/// Forward program writing `a + b` into `out` zero bits at slot `c`.
///
/// Slot `c` must already hold a zero bit; the remaining `out - 1` sum bits are
/// created by `And` as the carry chain advances.
pub(crate) fn forward(n: usize, carry: bool, a: usize, b: usize, c: usize) -> Program {
    let out = n + usize::from(carry);
    let mut p = Program::default();
    for i in 0..out - 1 {
        p.cnot(a + i, b + i);
        p.cnot(a + i, c + i);
        p.and(b + i, c + i, c + i + 1);
        p.cnot(a + i, b + i);
        p.cnot(a + i, c + i + 1);
        p.cnot(b + i, c + i);
    }
    if !carry {
        let i = n - 1;
        p.cnot(a + i, c + i);
        p.cnot(b + i, c + i);
    }
    p
}

pub(crate) fn decompose(oop: &OutOfPlaceAdder) -> RuleResult<WiringGraph> {
    let n = concrete(oop.bitwidth())? as usize;
    let carry = oop.include_carry_bit();
    let out = n + usize::from(carry);
    let program = forward(n, carry, 0, n, 2 * n);

    let mut bb = WiringBuilder::new(Bloq::OutOfPlaceAdder(oop.clone()).signature())?;
    let a = bb.input("a")?;
    let b = bb.input("b")?;
    if oop.is_adjoint() {
        let c = bb.input("c")?;
        let mut em = SlotEmitter::new(&mut bb);
        em.load_split(a)?;
        em.load_split(b)?;
        em.load_split(c)?;
        em.run(&program.inverse())?;
        let a = em.take_join(0..n)?;
        let b = em.take_join(n..2 * n)?;
        let c0 = em.take_one(2 * n)?;
        em.finish()?;
        bb.free(c0)?;
        Ok(bb.finish_whole(&[("a", a), ("b", b)])?)
    } else {
        let c0 = bb.allocate(1)?;
        let mut em = SlotEmitter::new(&mut bb);
        em.load_split(a)?;
        em.load_split(b)?;
        em.load_bits(vec![c0]);
        em.reserve(out - 1);
        em.run(&program)?;
        let a = em.take_join(0..n)?;
        let b = em.take_join(n..2 * n)?;
        let c = em.take_join(2 * n..2 * n + out)?;
        em.finish()?;
        Ok(bb.finish_whole(&[("a", a), ("b", b), ("c", c)])?)
    }
}
