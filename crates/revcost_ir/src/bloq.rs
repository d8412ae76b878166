//! Operation nodes: the closed union of supported primitives.
//!
//! A [`Bloq`] is an immutable value. Equality, ordering and hashing are
//! structural, so two nodes with identical parameters are the same node as far
//! as the call-graph aggregator is concerned. Composite parameter sets have
//! private fields and validating constructors; a value of type [`Add`] (and
//! friends) is always well formed.

use crate::error::ConfigurationError;
use crate::register::{Direction, Register, Signature};
use revcost_common::gf2_poly::{self, MAX_FIELD_DEGREE};
use revcost_common::{ContentHash, SymInt};
use serde::Serialize;
use std::fmt;

/// Any supported operation node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum Bloq {
    /// Bit flip on one bit.
    XGate,
    /// Controlled bit flip.
    Cnot,
    /// Doubly controlled bit flip onto an existing target.
    Toffoli,
    /// Logical AND into a fresh target; `uncompute` is the measurement-based
    /// inverse that consumes the target.
    And {
        /// Whether this is the uncomputing (adjoint) form.
        uncompute: bool,
    },
    /// Bit flip controlled on `ctrls[i] == cvs[i]` for every `i`.
    MultiControlX {
        /// Control values, one per control bit.
        cvs: Vec<u8>,
    },
    /// Produces a zeroed register.
    Allocate {
        /// Register width.
        bitwidth: SymInt,
    },
    /// Consumes a register that must be zero.
    Free {
        /// Register width.
        bitwidth: SymInt,
    },
    /// Breaks a register into single-bit wires.
    Split {
        /// Register width.
        bitwidth: SymInt,
    },
    /// Gathers single-bit wires into a register.
    Join {
        /// Register width.
        bitwidth: SymInt,
    },
    /// In-place quantum-quantum adder.
    Add(Add),
    /// Out-of-place adder or its uncomputation.
    OutOfPlaceAdder(OutOfPlaceAdder),
    /// In-place constant adder.
    AddK(AddK),
    /// GF(2^m) multiplier.
    GF2Multiplication(GF2Multiplication),
    /// One triangular stage of the GF(2^m) multiplier.
    GF2PartialProduct(GF2PartialProduct),
    /// The linear modular-reduction stage of the GF(2^m) multiplier.
    GF2Reduction(GF2Reduction),
}

impl Bloq {
    /// The uncomputing AND.
    pub const AND_ADJOINT: Bloq = Bloq::And { uncompute: true };
    /// The computing AND.
    pub const AND: Bloq = Bloq::And { uncompute: false };

    /// Creates a multi-controlled X after validating the control values.
    pub fn multi_control_x(cvs: Vec<u8>) -> Result<Self, ConfigurationError> {
        let bloq = Bloq::MultiControlX { cvs };
        bloq.validate()?;
        Ok(bloq)
    }

    /// Checks the parameters of gate variants, which can be built directly.
    ///
    /// Composite parameter sets are validated when constructed, so only the
    /// control tuple of [`Bloq::MultiControlX`] can be malformed here.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            Bloq::MultiControlX { cvs } if cvs.is_empty() => Err(ConfigurationError::NoControls),
            Bloq::MultiControlX { cvs } => check_control_values(cvs),
            _ => Ok(()),
        }
    }

    /// Short display name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Bloq::XGate => "XGate",
            Bloq::Cnot => "CNOT",
            Bloq::Toffoli => "Toffoli",
            Bloq::And { .. } => "And",
            Bloq::MultiControlX { .. } => "MultiControlX",
            Bloq::Allocate { .. } => "Allocate",
            Bloq::Free { .. } => "Free",
            Bloq::Split { .. } => "Split",
            Bloq::Join { .. } => "Join",
            Bloq::Add(_) => "Add",
            Bloq::OutOfPlaceAdder(_) => "OutOfPlaceAdder",
            Bloq::AddK(_) => "AddK",
            Bloq::GF2Multiplication(_) => "GF2Multiplication",
            Bloq::GF2PartialProduct(_) => "GF2PartialProduct",
            Bloq::GF2Reduction(_) => "GF2Reduction",
        }
    }

    /// Returns `true` for allocate, free, split and join.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            Bloq::Allocate { .. } | Bloq::Free { .. } | Bloq::Split { .. } | Bloq::Join { .. }
        )
    }

    /// Returns `true` for nodes with no decomposition: gates and bookkeeping.
    pub fn is_elementary(&self) -> bool {
        matches!(
            self,
            Bloq::XGate | Bloq::Cnot | Bloq::Toffoli | Bloq::And { .. } | Bloq::MultiControlX { .. }
        ) || self.is_bookkeeping()
    }

    /// Returns `true` if every size-like parameter is a concrete integer.
    pub fn is_concrete(&self) -> bool {
        match self {
            Bloq::XGate | Bloq::Cnot | Bloq::Toffoli | Bloq::And { .. } | Bloq::MultiControlX { .. } => true,
            Bloq::Allocate { bitwidth }
            | Bloq::Free { bitwidth }
            | Bloq::Split { bitwidth }
            | Bloq::Join { bitwidth } => bitwidth.is_concrete(),
            Bloq::Add(add) => add.a_bitwidth.is_concrete() && add.b_bitwidth.is_concrete(),
            Bloq::OutOfPlaceAdder(oop) => oop.bitwidth.is_concrete(),
            Bloq::AddK(add_k) => add_k.bitwidth.is_concrete() && add_k.k.is_concrete(),
            Bloq::GF2Multiplication(mul) => mul.bitsize.is_concrete(),
            Bloq::GF2PartialProduct(pp) => pp.bitsize.is_concrete(),
            Bloq::GF2Reduction(red) => red.bitsize.is_concrete(),
        }
    }

    /// The node's external signature.
    pub fn signature(&self) -> Signature {
        use Direction::{In, InOut, Out};
        let regs = match self {
            Bloq::XGate => vec![Register::thru("q", 1u32)],
            Bloq::Cnot => vec![Register::thru("ctrl", 1u32), Register::thru("target", 1u32)],
            Bloq::Toffoli => vec![
                Register::thru("ctrl0", 1u32),
                Register::thru("ctrl1", 1u32),
                Register::thru("target", 1u32),
            ],
            Bloq::And { uncompute } => vec![
                Register::thru("ctrl0", 1u32),
                Register::thru("ctrl1", 1u32),
                Register::new("target", 1u32, if *uncompute { In } else { Out }),
            ],
            Bloq::MultiControlX { cvs } => vec![
                Register::thru("ctrls", cvs.len()),
                Register::thru("target", 1u32),
            ],
            Bloq::Allocate { bitwidth } => vec![Register::new("reg", bitwidth.clone(), Out)],
            Bloq::Free { bitwidth } => vec![Register::new("reg", bitwidth.clone(), In)],
            Bloq::Split { bitwidth } => vec![
                Register::new("reg", bitwidth.clone(), In),
                Register::per_bit("bits", bitwidth.clone(), Out),
            ],
            Bloq::Join { bitwidth } => vec![
                Register::per_bit("bits", bitwidth.clone(), In),
                Register::new("reg", bitwidth.clone(), Out),
            ],
            Bloq::Add(add) => vec![
                Register::thru("a", add.a_bitwidth.clone()),
                Register::thru("b", add.b_bitwidth.clone()),
            ],
            Bloq::OutOfPlaceAdder(oop) => vec![
                Register::thru("a", oop.bitwidth.clone()),
                Register::thru("b", oop.bitwidth.clone()),
                Register::new("c", oop.out_bitwidth(), if oop.is_adjoint { In } else { Out }),
            ],
            Bloq::AddK(add_k) => {
                let mut regs = Vec::new();
                if !add_k.cvs.is_empty() {
                    regs.push(Register::thru("ctrls", add_k.cvs.len()));
                }
                regs.push(Register::thru("x", add_k.bitwidth.clone()));
                regs
            }
            Bloq::GF2Multiplication(mul) => vec![
                Register::thru("x", mul.bitsize.clone()),
                Register::thru("y", mul.bitsize.clone()),
                Register::new(
                    "result",
                    mul.bitsize.clone(),
                    if mul.plus_equal_prod { InOut } else { Out },
                ),
            ],
            Bloq::GF2PartialProduct(pp) => vec![
                Register::thru("x", pp.bitsize.clone()),
                Register::thru("y", pp.bitsize.clone()),
                Register::thru("result", pp.bitsize.clone()),
            ],
            Bloq::GF2Reduction(red) => vec![Register::thru("result", red.bitsize.clone())],
        };
        Signature::from_valid(regs)
    }

    /// The inverse node, when one is expressible in this vocabulary.
    pub fn adjoint(&self) -> Option<Bloq> {
        Some(match self {
            Bloq::XGate | Bloq::Cnot | Bloq::Toffoli | Bloq::MultiControlX { .. } => self.clone(),
            Bloq::And { uncompute } => Bloq::And {
                uncompute: !uncompute,
            },
            Bloq::Allocate { bitwidth } => Bloq::Free {
                bitwidth: bitwidth.clone(),
            },
            Bloq::Free { bitwidth } => Bloq::Allocate {
                bitwidth: bitwidth.clone(),
            },
            Bloq::Split { bitwidth } => Bloq::Join {
                bitwidth: bitwidth.clone(),
            },
            Bloq::Join { bitwidth } => Bloq::Split {
                bitwidth: bitwidth.clone(),
            },
            Bloq::OutOfPlaceAdder(oop) => Bloq::OutOfPlaceAdder(oop.adjoint()),
            Bloq::GF2Reduction(red) => Bloq::GF2Reduction(red.adjoint()),
            Bloq::Add(_) | Bloq::AddK(_) | Bloq::GF2Multiplication(_) | Bloq::GF2PartialProduct(_) => {
                return None
            }
        })
    }

    /// A stable 128-bit identity for this node.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(self)
    }
}

impl fmt::Display for Bloq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bloq::XGate => write!(f, "X"),
            Bloq::Cnot => write!(f, "CNOT"),
            Bloq::Toffoli => write!(f, "Toffoli"),
            Bloq::And { uncompute: false } => write!(f, "And"),
            Bloq::And { uncompute: true } => write!(f, "And†"),
            Bloq::MultiControlX { cvs } => write!(f, "MultiControlX({})", fmt_cvs(cvs)),
            Bloq::Allocate { bitwidth } => write!(f, "Allocate({bitwidth})"),
            Bloq::Free { bitwidth } => write!(f, "Free({bitwidth})"),
            Bloq::Split { bitwidth } => write!(f, "Split({bitwidth})"),
            Bloq::Join { bitwidth } => write!(f, "Join({bitwidth})"),
            Bloq::Add(add) => {
                write!(f, "Add(a={}, b={}", add.a_bitwidth, add.b_bitwidth)?;
                if add.signed {
                    write!(f, ", signed")?;
                }
                write!(f, ")")
            }
            Bloq::OutOfPlaceAdder(oop) => {
                write!(f, "OutOfPlaceAdder({}", oop.bitwidth)?;
                if oop.include_carry_bit {
                    write!(f, ", carry")?;
                }
                write!(f, ")")?;
                if oop.is_adjoint {
                    write!(f, "†")?;
                }
                Ok(())
            }
            Bloq::AddK(add_k) => {
                write!(f, "AddK({}, k={}", add_k.bitwidth, add_k.k)?;
                if !add_k.cvs.is_empty() {
                    write!(f, ", cvs={}", fmt_cvs(&add_k.cvs))?;
                }
                if add_k.signed {
                    write!(f, ", signed")?;
                }
                write!(f, ")")
            }
            Bloq::GF2Multiplication(mul) => {
                let op = if mul.plus_equal_prod { ", +=" } else { "" };
                write!(f, "GF2Multiplication({}{op})", mul.bitsize)
            }
            Bloq::GF2PartialProduct(pp) => write!(f, "GF2PartialProduct({}, {})", pp.bitsize, pp.part),
            Bloq::GF2Reduction(red) => {
                write!(f, "GF2Reduction({})", red.bitsize)?;
                if red.is_adjoint {
                    write!(f, "†")?;
                }
                Ok(())
            }
        }
    }
}

fn fmt_cvs(cvs: &[u8]) -> String {
    cvs.iter().map(u8::to_string).collect::<Vec<_>>().join("")
}

fn check_positive(op: &'static str, bitwidth: &SymInt) -> Result<(), ConfigurationError> {
    if bitwidth.is_known_non_positive() {
        return Err(ConfigurationError::NonPositiveBitwidth {
            op,
            bitwidth: bitwidth.clone(),
        });
    }
    Ok(())
}

fn check_control_values(cvs: &[u8]) -> Result<(), ConfigurationError> {
    match cvs.iter().find(|&&cv| cv > 1) {
        Some(&value) => Err(ConfigurationError::ControlValue { value }),
        None => Ok(()),
    }
}

fn check_field_degree(m: &SymInt) -> Result<(), ConfigurationError> {
    check_positive("GF2Multiplication", m)?;
    if let Some(value) = m.as_i64() {
        if !(1..=MAX_FIELD_DEGREE as i64).contains(&value) {
            return Err(ConfigurationError::UnsupportedFieldDegree { m: m.clone() });
        }
    }
    Ok(())
}

/// Parameters of the in-place adder `(a, b) -> (a, a + b mod 2^b_bitwidth)`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct Add {
    a_bitwidth: SymInt,
    b_bitwidth: SymInt,
    signed: bool,
}

impl Add {
    /// Creates an unsigned adder with the given operand widths.
    ///
    /// A wider `a` is accepted: its bits at or above `b_bitwidth` pass through
    /// untouched and the sum is taken modulo `2^b_bitwidth`. A narrower `a` is
    /// zero-extended.
    pub fn new(a_bitwidth: impl Into<SymInt>, b_bitwidth: impl Into<SymInt>) -> Result<Self, ConfigurationError> {
        let add = Self {
            a_bitwidth: a_bitwidth.into(),
            b_bitwidth: b_bitwidth.into(),
            signed: false,
        };
        check_positive("Add", &add.a_bitwidth)?;
        check_positive("Add", &add.b_bitwidth)?;
        Ok(add)
    }

    /// Creates an adder with both operands `n` bits wide.
    pub fn symmetric(n: impl Into<SymInt>) -> Result<Self, ConfigurationError> {
        let n = n.into();
        Self::new(n.clone(), n)
    }

    /// Marks the operands as two's complement.
    ///
    /// A signed `a` must be at least as wide as `b`, since the carry chain
    /// only zero-extends a narrow operand.
    pub fn with_signed(mut self, signed: bool) -> Result<Self, ConfigurationError> {
        if signed {
            let surplus = (&self.a_bitwidth - &self.b_bitwidth).as_i64();
            if !surplus.is_some_and(|d| d >= 0) {
                return Err(ConfigurationError::SignedNarrowOperand {
                    a_bitwidth: self.a_bitwidth,
                    b_bitwidth: self.b_bitwidth,
                });
            }
        }
        self.signed = signed;
        Ok(self)
    }

    /// Width of the `a` operand.
    pub fn a_bitwidth(&self) -> &SymInt {
        &self.a_bitwidth
    }

    /// Width of the `b` operand, which receives the sum.
    pub fn b_bitwidth(&self) -> &SymInt {
        &self.b_bitwidth
    }

    /// Whether the operands are two's complement.
    pub fn is_signed(&self) -> bool {
        self.signed
    }
}

/// Parameters of the out-of-place adder `(a, b, 0) -> (a, b, a + b)`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct OutOfPlaceAdder {
    bitwidth: SymInt,
    include_carry_bit: bool,
    is_adjoint: bool,
}

impl OutOfPlaceAdder {
    /// Creates the forward adder writing an `n + 1` bit sum.
    pub fn new(bitwidth: impl Into<SymInt>) -> Result<Self, ConfigurationError> {
        let oop = Self {
            bitwidth: bitwidth.into(),
            include_carry_bit: true,
            is_adjoint: false,
        };
        check_positive("OutOfPlaceAdder", &oop.bitwidth)?;
        Ok(oop)
    }

    /// Sets whether the sum register keeps the carry-out bit.
    pub fn with_carry_bit(mut self, include_carry_bit: bool) -> Self {
        self.include_carry_bit = include_carry_bit;
        self
    }

    /// Returns the uncomputing counterpart.
    pub fn adjoint(&self) -> Self {
        Self {
            is_adjoint: !self.is_adjoint,
            ..self.clone()
        }
    }

    /// Operand width.
    pub fn bitwidth(&self) -> &SymInt {
        &self.bitwidth
    }

    /// Whether the sum register keeps the carry-out bit.
    pub fn include_carry_bit(&self) -> bool {
        self.include_carry_bit
    }

    /// Whether this is the uncomputing form.
    pub fn is_adjoint(&self) -> bool {
        self.is_adjoint
    }

    /// Width of the sum register.
    pub fn out_bitwidth(&self) -> SymInt {
        if self.include_carry_bit {
            &self.bitwidth + &SymInt::lit(1)
        } else {
            self.bitwidth.clone()
        }
    }
}

/// Parameters of the constant adder `x -> x + k`, optionally controlled.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct AddK {
    bitwidth: SymInt,
    k: SymInt,
    cvs: Vec<u8>,
    signed: bool,
}

impl AddK {
    /// Creates an uncontrolled constant adder.
    ///
    /// An unsigned adder requires `0 <= k < 2^bitwidth`; a signed one requires
    /// `-2^(bitwidth-1) <= k < 2^(bitwidth-1)`. Checks involving a symbolic
    /// value are deferred, except that a concrete negative `k` is always
    /// rejected when unsigned.
    pub fn new(bitwidth: impl Into<SymInt>, k: impl Into<SymInt>, signed: bool) -> Result<Self, ConfigurationError> {
        Self::controlled(bitwidth, k, signed, Vec::new())
    }

    /// Creates a constant adder whose load is controlled on `cvs`.
    pub fn controlled(
        bitwidth: impl Into<SymInt>,
        k: impl Into<SymInt>,
        signed: bool,
        cvs: Vec<u8>,
    ) -> Result<Self, ConfigurationError> {
        let add_k = Self {
            bitwidth: bitwidth.into(),
            k: k.into(),
            cvs,
            signed,
        };
        check_positive("AddK", &add_k.bitwidth)?;
        check_control_values(&add_k.cvs)?;
        add_k.check_constant()?;
        Ok(add_k)
    }

    /// Like [`controlled`](Self::controlled), also checking `cvs` against a
    /// declared number of control lines.
    pub fn with_controls(
        bitwidth: impl Into<SymInt>,
        k: impl Into<SymInt>,
        signed: bool,
        num_controls: usize,
        cvs: Vec<u8>,
    ) -> Result<Self, ConfigurationError> {
        if cvs.len() != num_controls {
            return Err(ConfigurationError::ControlArity {
                expected: num_controls,
                found: cvs.len(),
            });
        }
        Self::controlled(bitwidth, k, signed, cvs)
    }

    fn check_constant(&self) -> Result<(), ConfigurationError> {
        let Some(k) = self.k.as_i64() else {
            return Ok(());
        };
        if !self.signed && k < 0 {
            return Err(ConfigurationError::NegativeUnsignedConstant { k: self.k.clone() });
        }
        let Some(n) = self.bitwidth.as_u32() else {
            return Ok(());
        };
        let k_wide = k as i128;
        let fits = match (self.signed, n) {
            (_, n) if n > 100 => true,
            (false, n) => k_wide < 1i128 << n,
            (true, n) => {
                let half = 1i128 << (n - 1);
                (-half..half).contains(&k_wide)
            }
        };
        if !fits {
            return Err(ConfigurationError::ConstantOutOfRange {
                k,
                bitwidth: n,
                signed: self.signed,
            });
        }
        Ok(())
    }

    /// Register width.
    pub fn bitwidth(&self) -> &SymInt {
        &self.bitwidth
    }

    /// The constant.
    pub fn k(&self) -> &SymInt {
        &self.k
    }

    /// Control values; empty when uncontrolled.
    pub fn cvs(&self) -> &[u8] {
        &self.cvs
    }

    /// Whether `x` is two's complement.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Returns a copy with a different constant, skipping range checks.
    ///
    /// Used by generalizers that coarsen `k` to a symbol.
    pub fn with_constant_unchecked(&self, k: SymInt) -> Self {
        Self { k, ..self.clone() }
    }

    /// Returns a copy with different control values of the same arity.
    pub fn with_control_values(&self, cvs: Vec<u8>) -> Result<Self, ConfigurationError> {
        if cvs.len() != self.cvs.len() {
            return Err(ConfigurationError::ControlArity {
                expected: self.cvs.len(),
                found: cvs.len(),
            });
        }
        check_control_values(&cvs)?;
        Ok(Self { cvs, ..self.clone() })
    }
}

/// Parameters of the GF(2^m) multiplier.
///
/// The modulus is the canonical irreducible polynomial of degree `m` (see
/// [`gf2_poly::canonical_polynomial`]); it is a property of `m`, not a
/// parameter.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct GF2Multiplication {
    bitsize: SymInt,
    plus_equal_prod: bool,
}

impl GF2Multiplication {
    /// Creates a multiplier over GF(2^m).
    ///
    /// With `plus_equal_prod` the product is XORed into an existing `result`
    /// register instead of a freshly allocated one.
    pub fn new(m: impl Into<SymInt>, plus_equal_prod: bool) -> Result<Self, ConfigurationError> {
        let mul = Self {
            bitsize: m.into(),
            plus_equal_prod,
        };
        check_field_degree(&mul.bitsize)?;
        Ok(mul)
    }

    /// Creates a multiplier after checking that `polynomial` is the field's
    /// canonical modulus.
    pub fn with_polynomial(m: impl Into<SymInt>, plus_equal_prod: bool, polynomial: u128) -> Result<Self, ConfigurationError> {
        let mul = Self::new(m, plus_equal_prod)?;
        let given = gf2_poly::format_polynomial(polynomial);
        let Some(m) = mul.bitsize.as_u32() else {
            return Err(ConfigurationError::SymbolicFieldDegree {
                m: mul.bitsize.clone(),
                given,
            });
        };
        let expected = mul.polynomial().unwrap_or_default();
        if polynomial != expected {
            return Err(ConfigurationError::InconsistentPolynomial {
                m,
                given,
                expected: gf2_poly::format_polynomial(expected),
            });
        }
        Ok(mul)
    }

    /// Field degree.
    pub fn bitsize(&self) -> &SymInt {
        &self.bitsize
    }

    /// Whether the product is accumulated into `result`.
    pub fn plus_equal_prod(&self) -> bool {
        self.plus_equal_prod
    }

    /// The field modulus, when the degree is concrete.
    pub fn polynomial(&self) -> Option<u128> {
        self.bitsize.as_u32().and_then(gf2_poly::canonical_polynomial)
    }
}

/// Which triangle of the schoolbook product a [`GF2PartialProduct`] computes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub enum ProductPart {
    /// Coefficients `m .. 2m-2`, folded down by the reduction.
    Upper,
    /// Coefficients `0 .. m-1`.
    Lower,
}

impl fmt::Display for ProductPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductPart::Upper => write!(f, "upper"),
            ProductPart::Lower => write!(f, "lower"),
        }
    }
}

/// XORs one triangle of the polynomial product `x * y` into `result`.
///
/// `Upper` adds `e_i = sum_{j>i} x_{m+i-j} y_j` into `result_i` for
/// `i < m-1`; `Lower` adds `d_k = sum_{j<=k} x_{k-j} y_j` into `result_k`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct GF2PartialProduct {
    bitsize: SymInt,
    part: ProductPart,
}

impl GF2PartialProduct {
    /// Creates a partial-product stage for GF(2^m).
    pub fn new(m: impl Into<SymInt>, part: ProductPart) -> Result<Self, ConfigurationError> {
        let pp = Self {
            bitsize: m.into(),
            part,
        };
        check_field_degree(&pp.bitsize)?;
        Ok(pp)
    }

    /// Field degree.
    pub fn bitsize(&self) -> &SymInt {
        &self.bitsize
    }

    /// Which triangle is computed.
    pub fn part(&self) -> ProductPart {
        self.part
    }
}

/// Applies the invertible reduction map `M = [Q | v]` of GF(2^m) in place.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct GF2Reduction {
    bitsize: SymInt,
    is_adjoint: bool,
}

impl GF2Reduction {
    /// Creates the forward reduction for GF(2^m).
    pub fn new(m: impl Into<SymInt>) -> Result<Self, ConfigurationError> {
        let red = Self {
            bitsize: m.into(),
            is_adjoint: false,
        };
        check_field_degree(&red.bitsize)?;
        Ok(red)
    }

    /// Returns the inverse map.
    pub fn adjoint(&self) -> Self {
        Self {
            is_adjoint: !self.is_adjoint,
            ..self.clone()
        }
    }

    /// Field degree.
    pub fn bitsize(&self) -> &SymInt {
        &self.bitsize
    }

    /// Whether this applies `M^-1`.
    pub fn is_adjoint(&self) -> bool {
        self.is_adjoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> SymInt {
        SymInt::symbol("n")
    }

    #[test]
    fn structural_equality() {
        let a = Bloq::Add(Add::symmetric(8u32).unwrap());
        let b = Bloq::Add(Add::new(8u32, 8u32).unwrap());
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
        let c = Bloq::Add(Add::symmetric(8u32).unwrap().with_signed(true).unwrap());
        assert_ne!(a, c);
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn zero_width_rejected() {
        assert!(matches!(
            Add::symmetric(0u32),
            Err(ConfigurationError::NonPositiveBitwidth { op: "Add", .. })
        ));
        assert!(OutOfPlaceAdder::new(SymInt::lit(-2)).is_err());
        assert!(Add::symmetric(n()).is_ok());
    }

    #[test]
    fn hand_built_control_tuples_are_checked() {
        assert_eq!(Bloq::MultiControlX { cvs: vec![] }.validate(), Err(ConfigurationError::NoControls));
        assert_eq!(
            Bloq::MultiControlX { cvs: vec![1, 7] }.validate(),
            Err(ConfigurationError::ControlValue { value: 7 })
        );
        assert_eq!(Bloq::MultiControlX { cvs: vec![0, 1] }.validate(), Ok(()));
        assert_eq!(Bloq::Toffoli.validate(), Ok(()));
    }

    #[test]
    fn signed_add_needs_wide_a() {
        assert!(matches!(
            Add::new(3u32, 6u32).unwrap().with_signed(true),
            Err(ConfigurationError::SignedNarrowOperand { .. })
        ));
        assert!(Add::new(n(), n() + SymInt::lit(1)).unwrap().with_signed(true).is_err());
        assert!(Add::new(SymInt::symbol("m"), n()).unwrap().with_signed(true).is_err());
        assert!(Add::new(6u32, 3u32).unwrap().with_signed(true).is_ok());
        assert!(Add::new(n() + SymInt::lit(2), n()).unwrap().with_signed(true).is_ok());
        assert!(Add::new(3u32, 6u32).unwrap().with_signed(false).is_ok());
    }

    #[test]
    fn add_k_unsigned_negative_rejected() {
        let err = AddK::new(8u32, -1i64, false).unwrap_err();
        assert_eq!(err, ConfigurationError::NegativeUnsignedConstant { k: SymInt::lit(-1) });
        let err = AddK::new(n(), -1i64, false).unwrap_err();
        assert!(matches!(err, ConfigurationError::NegativeUnsignedConstant { .. }));
        assert!(AddK::new(8u32, -1i64, true).is_ok());
    }

    #[test]
    fn add_k_range_checks() {
        assert!(AddK::new(4u32, 15i64, false).is_ok());
        assert!(matches!(
            AddK::new(4u32, 16i64, false),
            Err(ConfigurationError::ConstantOutOfRange { .. })
        ));
        assert!(AddK::new(4u32, 7i64, true).is_ok());
        assert!(AddK::new(4u32, -8i64, true).is_ok());
        assert!(AddK::new(4u32, 8i64, true).is_err());
        assert!(AddK::new(4u32, -9i64, true).is_err());
        assert!(AddK::new(64u32, i64::MAX, false).is_ok());
        assert!(AddK::new(n(), SymInt::symbol("k"), false).is_ok());
    }

    #[test]
    fn add_k_controls() {
        assert_eq!(
            AddK::with_controls(4u32, 3i64, false, 2, vec![1]).unwrap_err(),
            ConfigurationError::ControlArity { expected: 2, found: 1 }
        );
        assert_eq!(
            AddK::controlled(4u32, 3i64, false, vec![2]).unwrap_err(),
            ConfigurationError::ControlValue { value: 2 }
        );
        let add_k = AddK::with_controls(4u32, 3i64, false, 2, vec![1, 0]).unwrap();
        let sig = Bloq::AddK(add_k.clone()).signature();
        assert_eq!(sig.get("ctrls").unwrap().bitwidth(), &SymInt::lit(2));
        assert!(add_k.with_control_values(vec![1]).is_err());
        assert_eq!(add_k.with_control_values(vec![1, 1]).unwrap().cvs(), &[1, 1]);
    }

    #[test]
    fn multi_control_x_validation() {
        assert_eq!(Bloq::multi_control_x(vec![]).unwrap_err(), ConfigurationError::NoControls);
        assert!(Bloq::multi_control_x(vec![1, 3]).is_err());
        assert!(Bloq::multi_control_x(vec![0, 1]).is_ok());
    }

    #[test]
    fn field_degree_checks() {
        assert!(GF2Multiplication::new(64u32, false).is_ok());
        assert!(matches!(
            GF2Multiplication::new(65u32, false),
            Err(ConfigurationError::UnsupportedFieldDegree { .. })
        ));
        assert!(GF2Multiplication::new(0u32, true).is_err());
        assert!(GF2Multiplication::new(SymInt::symbol("m"), true).is_ok());
    }

    #[test]
    fn polynomial_consistency() {
        assert!(GF2Multiplication::with_polynomial(4u32, true, 0b10011).is_ok());
        let err = GF2Multiplication::with_polynomial(4u32, true, 0b11001).unwrap_err();
        assert_eq!(
            err.to_string(),
            "polynomial x^4 + x^3 + 1 is not the canonical modulus x^4 + x + 1 of GF(2^4)"
        );
        assert!(matches!(
            GF2Multiplication::with_polynomial(SymInt::symbol("m"), false, 0b111),
            Err(ConfigurationError::SymbolicFieldDegree { .. })
        ));
    }

    #[test]
    fn signatures() {
        let oop = Bloq::OutOfPlaceAdder(OutOfPlaceAdder::new(n()).unwrap());
        let sig = oop.signature();
        assert_eq!(sig.get("c").unwrap().direction(), Direction::Out);
        assert_eq!(sig.get("c").unwrap().bitwidth().to_string(), "n + 1");
        let adj = oop.adjoint().unwrap();
        assert_eq!(adj.signature(), sig.adjoint());

        let mul = Bloq::GF2Multiplication(GF2Multiplication::new(4u32, false).unwrap());
        assert_eq!(mul.signature().get("result").unwrap().direction(), Direction::Out);
        assert_eq!(Bloq::AND.adjoint(), Some(Bloq::AND_ADJOINT));
        assert_eq!(Bloq::AND.signature().adjoint(), Bloq::AND_ADJOINT.signature());
    }

    #[test]
    fn classification() {
        assert!(Bloq::Toffoli.is_elementary());
        assert!(Bloq::Split { bitwidth: n() }.is_bookkeeping());
        assert!(!Bloq::Split { bitwidth: n() }.is_concrete());
        let add = Bloq::Add(Add::symmetric(n()).unwrap());
        assert!(!add.is_elementary());
        assert!(!add.is_concrete());
        assert!(add.adjoint().is_none());
    }

    #[test]
    fn display() {
        assert_eq!(Bloq::Add(Add::symmetric(n()).unwrap()).to_string(), "Add(a=n, b=n)");
        assert_eq!(
            Bloq::OutOfPlaceAdder(OutOfPlaceAdder::new(4u32).unwrap().adjoint()).to_string(),
            "OutOfPlaceAdder(4, carry)†"
        );
        assert_eq!(
            Bloq::AddK(AddK::controlled(4u32, 5i64, false, vec![1, 0]).unwrap()).to_string(),
            "AddK(4, k=5, cvs=10)"
        );
        assert_eq!(
            Bloq::GF2Multiplication(GF2Multiplication::new(SymInt::symbol("m"), true).unwrap()).to_string(),
            "GF2Multiplication(m, +=)"
        );
        assert_eq!(Bloq::AND_ADJOINT.to_string(), "And†");
        assert_eq!(Bloq::multi_control_x(vec![1, 0]).unwrap().to_string(), "MultiControlX(10)");
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_string(&Bloq::Add(Add::symmetric(4u32).unwrap())).unwrap();
        assert!(json.contains("\"Add\""));
    }
}
