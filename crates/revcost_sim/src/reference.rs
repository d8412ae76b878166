//! Direct arithmetic semantics of the composite nodes.
//!
//! Decompositions are checked against these definitions:
//! wrapping integer addition and GF(2^m) products, computed without looking
//! at any wiring graph.

use crate::error::SimError;
use crate::evaluator::{check_inputs, input, Values};
use crate::gates;
use revcost_common::{gf2_poly, Bits, SymInt};
use revcost_ir::{AddK, Bloq, GF2Multiplication, GF2PartialProduct, OutOfPlaceAdder, ProductPart};

/// `a + b` truncated to `width` bits; missing operand bits read as zero.
pub fn wrapping_add(a: &Bits, b: &Bits, width: u32) -> Bits {
    let bit = |v: &Bits, i: u32| i < v.width() && v.get(i);
    let mut sum = Bits::new(width);
    let mut carry = false;
    for i in 0..width {
        let (x, y) = (bit(a, i), bit(b, i));
        sum.set(i, x ^ y ^ carry);
        carry = (x & y) | (carry & (x ^ y));
    }
    sum
}

fn concrete(bloq: &Bloq, value: &SymInt) -> Result<u32, SimError> {
    value.as_u32().ok_or_else(|| SimError::Symbolic { bloq: bloq.to_string() })
}

/// Evaluates `bloq` by its arithmetic meaning rather than its decomposition.
pub fn classical_action(bloq: &Bloq, inputs: &Values) -> Result<Values, SimError> {
    let op = bloq.to_string();
    check_inputs(&op, &bloq.signature(), inputs)?;
    if bloq.is_elementary() {
        return gates::eval(bloq, inputs);
    }
    let mut out = inputs.clone();
    match bloq {
        Bloq::Add(add) => {
            let n = concrete(bloq, add.b_bitwidth())?;
            let sum = wrapping_add(input(&op, inputs, "a")?, input(&op, inputs, "b")?, n);
            out.insert("b".into(), sum);
        }
        Bloq::OutOfPlaceAdder(oop) => out_of_place(bloq, oop, inputs, &mut out)?,
        Bloq::AddK(add_k) => {
            let sum = add_constant(bloq, add_k, inputs)?;
            out.insert("x".into(), sum);
        }
        Bloq::GF2Multiplication(mul) => {
            let product = multiply(bloq, mul, inputs)?;
            out.insert("result".into(), product);
        }
        Bloq::GF2PartialProduct(pp) => {
            let result = partial_product(bloq, pp, inputs)?;
            out.insert("result".into(), result);
        }
        _ => return Err(SimError::NoReference { bloq: op }),
    }
    Ok(out)
}

fn out_of_place(bloq: &Bloq, oop: &OutOfPlaceAdder, inputs: &Values, out: &mut Values) -> Result<(), SimError> {
    let op = bloq.to_string();
    let width = concrete(bloq, &oop.out_bitwidth())?;
    let sum = wrapping_add(input(&op, inputs, "a")?, input(&op, inputs, "b")?, width);
    if oop.is_adjoint() {
        let found = input(&op, inputs, "c")?;
        if *found != sum {
            return Err(SimError::InconsistentUncompute {
                op,
                expected: sum.to_string(),
                found: found.to_string(),
            });
        }
        out.remove("c");
    } else {
        out.insert("c".into(), sum);
    }
    Ok(())
}

fn add_constant(bloq: &Bloq, add_k: &AddK, inputs: &Values) -> Result<Bits, SimError> {
    let op = bloq.to_string();
    let n = concrete(bloq, add_k.bitwidth())?;
    let k = add_k.k().as_i64().ok_or_else(|| SimError::Symbolic { bloq: op.clone() })?;
    let x = input(&op, inputs, "x")?;
    let active = match add_k.cvs() {
        [] => true,
        cvs => {
            let ctrls = input(&op, inputs, "ctrls")?;
            ctrls.iter().zip(cvs).all(|(bit, &cv)| bit == (cv == 1))
        }
    };
    Ok(if active {
        wrapping_add(&Bits::from_i128(i128::from(k), n), x, n)
    } else {
        x.clone()
    })
}

fn multiply(bloq: &Bloq, mul: &GF2Multiplication, inputs: &Values) -> Result<Bits, SimError> {
    let op = bloq.to_string();
    let m = concrete(bloq, mul.bitsize())?;
    let poly = mul.polynomial().ok_or_else(|| SimError::NoReference { bloq: op.clone() })?;
    let as_int = |name: &str| -> Result<u128, SimError> {
        input(&op, inputs, name)?
            .to_u128()
            .ok_or_else(|| SimError::NoReference { bloq: op.clone() })
    };
    let mut product = gf2_poly::mul_mod(as_int("x")?, as_int("y")?, poly);
    if mul.plus_equal_prod() {
        product ^= as_int("result")?;
    }
    Ok(Bits::from_u128(product, m))
}

fn partial_product(bloq: &Bloq, pp: &GF2PartialProduct, inputs: &Values) -> Result<Bits, SimError> {
    let op = bloq.to_string();
    let m = concrete(bloq, pp.bitsize())?;
    let (x, y) = (input(&op, inputs, "x")?, input(&op, inputs, "y")?);
    let mut result = input(&op, inputs, "result")?.clone();
    let term = |i: u32, j: u32| x.get(i) & y.get(j);
    for k in 0..m {
        let coefficient = match pp.part() {
            ProductPart::Upper if k + 1 < m => (k + 1..m).fold(false, |acc, j| acc ^ term(m + k - j, j)),
            ProductPart::Upper => false,
            ProductPart::Lower => (0..=k).fold(false, |acc, j| acc ^ term(k - j, j)),
        };
        if coefficient {
            result.flip(k);
        }
    }
    Ok(result)
}
