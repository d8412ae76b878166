//! GF(2^m) multiplication as upper product, reduction, lower product.
//!
//! With `e` the upper triangle of the schoolbook product and `d` the lower
//! one, `x * y mod P = d + Q e`. The upper stage writes `e` into `result`,
//! the reduction maps it to `Q e` and the lower stage adds `d` on top. When
//! accumulating, `M^-1` is applied first so that the existing value survives
//! the reduction.

use crate::circuit::{Program, SlotEmitter};
use crate::concrete;
use crate::error::RuleResult;
use crate::linear::BitMatrix;
use revcost_ir::{
    Bloq, GF2Multiplication, GF2PartialProduct, GF2Reduction, ProductPart, WiringBuilder, WiringGraph,
};

/// Toffolis of one product triangle over slots `x`, `y`, `r`.
pub(crate) fn partial_product(m: usize, part: ProductPart, x: usize, y: usize, r: usize) -> Program {
    let mut p = Program::default();
    match part {
        ProductPart::Upper => {
            for i in 0..m.saturating_sub(1) {
                for j in i + 1..m {
                    p.toffoli(x + m + i - j, y + j, r + i);
                }
            }
        }
        ProductPart::Lower => {
            for k in 0..m {
                for j in 0..=k {
                    p.toffoli(x + k - j, y + j, r + k);
                }
            }
        }
    }
    p
}

pub(crate) fn decompose_multiplication(mul: &GF2Multiplication) -> RuleResult<WiringGraph> {
    let m = concrete(mul.bitsize())?;
    let mut bb = WiringBuilder::new(Bloq::GF2Multiplication(mul.clone()).signature())?;
    let x = bb.input("x")?;
    let y = bb.input("y")?;
    let result = if mul.plus_equal_prod() {
        let result = bb.input("result")?;
        let [result] = bb.add_n(
            Bloq::GF2Reduction(GF2Reduction::new(m)?.adjoint()),
            &[("result", result)],
        )?;
        result
    } else {
        bb.allocate(m)?
    };
    let upper = Bloq::GF2PartialProduct(GF2PartialProduct::new(m, ProductPart::Upper)?);
    let [x, y, r] = bb.add_n(upper, &[("x", x), ("y", y), ("result", result)])?;
    let [result] = bb.add_n(Bloq::GF2Reduction(GF2Reduction::new(m)?), &[("result", r)])?;
    let lower = Bloq::GF2PartialProduct(GF2PartialProduct::new(m, ProductPart::Lower)?);
    let [x, y, result] = bb.add_n(lower, &[("x", x), ("y", y), ("result", result)])?;
    Ok(bb.finish_whole(&[("x", x), ("y", y), ("result", result)])?)
}

pub(crate) fn decompose_partial_product(pp: &GF2PartialProduct) -> RuleResult<WiringGraph> {
    let m = concrete(pp.bitsize())? as usize;
    let mut bb = WiringBuilder::new(Bloq::GF2PartialProduct(pp.clone()).signature())?;
    let (x, y, r) = (bb.input("x")?, bb.input("y")?, bb.input("result")?);
    let mut em = SlotEmitter::new(&mut bb);
    let xs = em.load_split(x)?;
    let ys = em.load_split(y)?;
    let rs = em.load_split(r)?;
    em.run(&partial_product(m, pp.part(), xs.start, ys.start, rs.start))?;
    let x = em.take_join(xs)?;
    let y = em.take_join(ys)?;
    let r = em.take_join(rs)?;
    em.finish()?;
    Ok(bb.finish_whole(&[("x", x), ("y", y), ("result", r)])?)
}

pub(crate) fn decompose_reduction(red: &GF2Reduction) -> RuleResult<WiringGraph> {
    let m = concrete(red.bitsize())?;
    let program = BitMatrix::reduction(m)?.program(0)?;
    let program = if red.is_adjoint() { program.inverse() } else { program };
    let mut bb = WiringBuilder::new(Bloq::GF2Reduction(red.clone()).signature())?;
    let r = bb.input("result")?;
    let mut em = SlotEmitter::new(&mut bb);
    let rs = em.load_split(r)?;
    em.run(&program)?;
    let r = em.take_join(rs)?;
    em.finish()?;
    Ok(bb.finish_whole(&[("result", r)])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revcost_common::SymInt;

    #[test]
    fn triangle_sizes() {
        for m in 1..=10 {
            assert_eq!(partial_product(m, ProductPart::Upper, 0, m, 2 * m).gates().len(), m * (m - 1) / 2);
            assert_eq!(partial_product(m, ProductPart::Lower, 0, m, 2 * m).gates().len(), m * (m + 1) / 2);
        }
    }

    #[test]
    fn pipeline_stages() {
        let mul = GF2Multiplication::new(4u32, false).unwrap();
        let counts = decompose_multiplication(&mul).unwrap().bloq_counts();
        assert_eq!(counts.len(), 4);
        assert_eq!(counts[&Bloq::Allocate { bitwidth: SymInt::lit(4) }], 1);

        let acc = GF2Multiplication::new(4u32, true).unwrap();
        let counts = decompose_multiplication(&acc).unwrap().bloq_counts();
        let adjoint = Bloq::GF2Reduction(GF2Reduction::new(4u32).unwrap().adjoint());
        assert_eq!(counts[&adjoint], 1);
        assert!(!counts.keys().any(|b| matches!(b, Bloq::Allocate { .. })));
    }

    #[test]
    fn stage_gate_counts() {
        let upper = GF2PartialProduct::new(5u32, ProductPart::Upper).unwrap();
        assert_eq!(decompose_partial_product(&upper).unwrap().bloq_counts()[&Bloq::Toffoli], 10);
        let lower = GF2PartialProduct::new(5u32, ProductPart::Lower).unwrap();
        assert_eq!(decompose_partial_product(&lower).unwrap().bloq_counts()[&Bloq::Toffoli], 15);

        let red = GF2Reduction::new(8u32).unwrap();
        let counts = decompose_reduction(&red).unwrap().bloq_counts();
        assert!(counts.get(&Bloq::Cnot).copied().unwrap_or(0) <= 56);
        assert!(counts.keys().all(|b| *b == Bloq::Cnot || b.is_bookkeeping()));
    }
}
