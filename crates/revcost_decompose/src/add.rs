//! Ripple-carry addition (Gidney, arXiv:1709.06648).
//!
//! Carries live in `n - 1` temporary bits created with `And` and erased with
//! measurement-based `And†`, so the only T-cost is the `n - 1` computing ANDs.
//! Positions of `a` at or above `b_bitwidth` are never touched; positions of
//! `b` beyond `a_bitwidth` see an implicit zero from `a`.

use crate::circuit::{Program, SlotEmitter};
use crate::concrete;
use crate::error::RuleResult;
use revcost_ir::{Add, Bloq, WiringBuilder, WiringGraph};

/// Gate program for `b += a` with `m`-bit `a` at slot `a`, `n`-bit `b` at slot
/// `b` and `n - 1` empty carry slots starting at `c`.
pub(crate) fn ripple_carry(m: usize, n: usize, a: usize, b: usize, c: usize) -> Program {
    let mut p = Program::default();
    if n == 1 {
        p.cnot(a, b);
        return p;
    }
    p.and(a, b, c);
    for d in 1..n - 1 {
        let ctrl = if d < m {
            p.cnot(c + d - 1, a + d);
            a + d
        } else {
            c + d - 1
        };
        p.cnot(c + d - 1, b + d);
        p.and(ctrl, b + d, c + d);
        p.cnot(c + d - 1, c + d);
    }
    p.cnot(c + n - 2, b + n - 1);
    if m >= n {
        p.cnot(a + n - 1, b + n - 1);
    }
    for d in (1..n - 1).rev() {
        p.cnot(c + d - 1, c + d);
        if d < m {
            p.and_adjoint(a + d, b + d, c + d);
            p.cnot(c + d - 1, a + d);
            p.cnot(a + d, b + d);
        } else {
            p.and_adjoint(c + d - 1, b + d, c + d);
        }
    }
    p.and_adjoint(a, b, c);
    p.cnot(a, b);
    p
}

pub(crate) fn decompose(add: &Add) -> RuleResult<WiringGraph> {
    let m = concrete(add.a_bitwidth())? as usize;
    let n = concrete(add.b_bitwidth())? as usize;
    let mut bb = WiringBuilder::new(Bloq::Add(add.clone()).signature())?;
    let a = bb.input("a")?;
    let b = bb.input("b")?;
    let mut em = SlotEmitter::new(&mut bb);
    let a_slots = em.load_split(a)?;
    let b_slots = em.load_split(b)?;
    let carries = em.reserve(n - 1);
    em.run(&ripple_carry(m, n, a_slots.start, b_slots.start, carries.start))?;
    let a = em.take_join(a_slots)?;
    let b = em.take_join(b_slots)?;
    em.finish()?;
    Ok(bb.finish_whole(&[("a", a), ("b", b)])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Gate;

    fn count(p: &Program, f: impl Fn(&Gate) -> bool) -> usize {
        p.gates().iter().filter(|g| f(g)).count()
    }

    #[test]
    fn equal_width_gate_counts() {
        for n in 2..=16 {
            let p = ripple_carry(n, n, 0, n, 2 * n);
            assert_eq!(count(&p, |g| matches!(g, Gate::And { .. })), n - 1);
            assert_eq!(count(&p, |g| matches!(g, Gate::AndAdjoint { .. })), n - 1);
            assert_eq!(count(&p, |g| matches!(g, Gate::Cnot { .. })), 6 * n - 9);
        }
    }

    #[test]
    fn single_bit_is_one_cnot() {
        let p = ripple_carry(1, 1, 0, 1, 2);
        assert_eq!(p.gates(), &[Gate::Cnot { ctrl: 0, target: 1 }]);
    }

    #[test]
    fn high_bits_of_wide_a_untouched() {
        let p = ripple_carry(5, 3, 0, 5, 8);
        for gate in p.gates() {
            let slots = match *gate {
                Gate::Cnot { ctrl, target } => vec![ctrl, target],
                Gate::And { ctrl0, ctrl1, target } | Gate::AndAdjoint { ctrl0, ctrl1, target } => {
                    vec![ctrl0, ctrl1, target]
                }
                _ => vec![],
            };
            assert!(slots.iter().all(|s| !(3..5).contains(s)), "{gate:?}");
        }
    }

    #[test]
    fn graph_matches_signature() {
        let add = Add::new(3u32, 5u32).unwrap();
        let graph = decompose(&add).unwrap();
        assert_eq!(graph.signature(), &Bloq::Add(add).signature());
        let counts = graph.bloq_counts();
        assert_eq!(counts[&Bloq::AND], 4);
        assert_eq!(counts[&Bloq::AND_ADJOINT], 4);
    }
}
