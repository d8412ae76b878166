//! Semantics of elementary gates and bookkeeping nodes.

use crate::error::SimError;
use crate::evaluator::{input, Values};
use revcost_common::Bits;
use revcost_ir::Bloq;

fn width_of(bloq: &Bloq, bitwidth: &revcost_common::SymInt) -> Result<u32, SimError> {
    bitwidth.as_u32().ok_or_else(|| SimError::Symbolic {
        bloq: bloq.to_string(),
    })
}

/// Evaluates an elementary node on register values already checked against
/// its signature.
pub(crate) fn eval(bloq: &Bloq, inputs: &Values) -> Result<Values, SimError> {
    bloq.validate()?;
    let op = bloq.to_string();
    let get = |name: &str| input(&op, inputs, name).cloned();
    let mut out = Values::new();
    match bloq {
        Bloq::XGate => {
            let mut q = get("q")?;
            q.flip(0);
            out.insert("q".into(), q);
        }
        Bloq::Cnot => {
            let (ctrl, target) = (get("ctrl")?, get("target")?);
            out.insert("target".into(), &target ^ &ctrl);
            out.insert("ctrl".into(), ctrl);
        }
        Bloq::Toffoli => {
            let (c0, c1, target) = (get("ctrl0")?, get("ctrl1")?, get("target")?);
            out.insert("target".into(), &target ^ &(&c0 & &c1));
            out.insert("ctrl0".into(), c0);
            out.insert("ctrl1".into(), c1);
        }
        Bloq::And { uncompute } => {
            let (c0, c1) = (get("ctrl0")?, get("ctrl1")?);
            let and = &c0 & &c1;
            if *uncompute {
                let target = get("target")?;
                if target != and {
                    return Err(SimError::UncomputeMismatch {
                        target: target.get(0),
                        expected: and.get(0),
                    });
                }
            } else {
                out.insert("target".into(), and);
            }
            out.insert("ctrl0".into(), c0);
            out.insert("ctrl1".into(), c1);
        }
        Bloq::MultiControlX { cvs } => {
            let (ctrls, mut target) = (get("ctrls")?, get("target")?);
            if ctrls.iter().zip(cvs).all(|(bit, &cv)| bit == (cv == 1)) {
                target.flip(0);
            }
            out.insert("ctrls".into(), ctrls);
            out.insert("target".into(), target);
        }
        Bloq::Allocate { bitwidth } => {
            out.insert("reg".into(), Bits::new(width_of(bloq, bitwidth)?));
        }
        Bloq::Free { .. } => {
            let reg = get("reg")?;
            if !reg.is_all_zero() {
                return Err(SimError::DirtyFree { value: reg.to_string() });
            }
        }
        Bloq::Split { .. } => {
            out.insert("bits".into(), get("reg")?);
        }
        Bloq::Join { .. } => {
            out.insert("reg".into(), get("bits")?);
        }
        _ => return Err(SimError::NoReference { bloq: bloq.to_string() }),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::values;

    fn bit(b: bool) -> Bits {
        Bits::from_bool(b)
    }

    #[test]
    fn toffoli_truth_table() {
        for (a, b, t) in [(false, false, false), (true, true, false), (true, true, true), (true, false, true)] {
            let out = eval(&Bloq::Toffoli, &values([("ctrl0", bit(a)), ("ctrl1", bit(b)), ("target", bit(t))])).unwrap();
            assert_eq!(out["target"], bit(t ^ (a & b)));
        }
    }

    #[test]
    fn malformed_control_tuple_rejected() {
        let ins = values([("ctrls", Bits::from_u128(0b11, 2)), ("target", bit(false))]);
        let err = eval(&Bloq::MultiControlX { cvs: vec![1, 7] }, &ins).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn and_round_trip() {
        let ins = values([("ctrl0", bit(true)), ("ctrl1", bit(true))]);
        let out = eval(&Bloq::AND, &ins).unwrap();
        assert_eq!(out["target"], bit(true));
        assert!(eval(&Bloq::AND_ADJOINT, &out).unwrap().get("target").is_none());

        let bad = values([("ctrl0", bit(true)), ("ctrl1", bit(false)), ("target", bit(true))]);
        assert!(matches!(
            eval(&Bloq::AND_ADJOINT, &bad),
            Err(SimError::UncomputeMismatch { target: true, expected: false })
        ));
    }

    #[test]
    fn multi_control_respects_values() {
        let mcx = Bloq::multi_control_x(vec![1, 0]).unwrap();
        let fire = values([("ctrls", Bits::from_u128(0b01, 2)), ("target", bit(false))]);
        assert_eq!(eval(&mcx, &fire).unwrap()["target"], bit(true));
        let hold = values([("ctrls", Bits::from_u128(0b11, 2)), ("target", bit(false))]);
        assert_eq!(eval(&mcx, &hold).unwrap()["target"], bit(false));
    }

    #[test]
    fn free_requires_zero() {
        let free = Bloq::Free { bitwidth: 3u32.into() };
        assert!(eval(&free, &values([("reg", Bits::new(3))])).unwrap().is_empty());
        let err = eval(&free, &values([("reg", Bits::from_u128(2, 3))])).unwrap_err();
        assert_eq!(err, SimError::DirtyFree { value: "010".into() });
    }
}
