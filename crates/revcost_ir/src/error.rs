//! Construction and wiring errors.

use revcost_common::SymInt;

/// Invalid or inconsistent parameters for an operation node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A bitwidth or field degree was zero or negative.
    #[error("{op}: bitwidth must be positive, got {bitwidth}")]
    NonPositiveBitwidth {
        /// The operation being constructed.
        op: &'static str,
        /// The rejected value.
        bitwidth: SymInt,
    },

    /// Two registers of one signature share a name.
    #[error("duplicate register name `{name}`")]
    DuplicateRegister {
        /// The repeated name.
        name: String,
    },

    /// A control value other than 0 or 1.
    #[error("control values must be 0 or 1, got {value}")]
    ControlValue {
        /// The rejected value.
        value: u8,
    },

    /// The control-value tuple does not match the declared control count.
    #[error("expected {expected} control values, got {found}")]
    ControlArity {
        /// Declared number of control lines.
        expected: usize,
        /// Length of the supplied tuple.
        found: usize,
    },

    /// A multi-controlled gate without controls.
    #[error("multi-controlled X needs at least one control")]
    NoControls,

    /// An unsigned constant adder asked to add a negative value.
    #[error("unsigned AddK cannot hold negative constant {k}")]
    NegativeUnsignedConstant {
        /// The rejected constant.
        k: SymInt,
    },

    /// A constant that does not fit the register.
    #[error("constant {k} does not fit in {bitwidth} {} bits", signedness(.signed))]
    ConstantOutOfRange {
        /// The rejected constant.
        k: i64,
        /// The register width.
        bitwidth: u32,
        /// Whether the register is two's complement.
        signed: bool,
    },

    /// A field degree outside `1..=64`.
    #[error("GF(2^m) degree {m} is not supported (expected 1..=64)")]
    UnsupportedFieldDegree {
        /// The rejected degree.
        m: SymInt,
    },

    /// A signed adder whose `a` operand may be narrower than `b`.
    #[error("signed Add needs a_bitwidth >= b_bitwidth, got a={a_bitwidth}, b={b_bitwidth}")]
    SignedNarrowOperand {
        /// Width of `a`.
        a_bitwidth: SymInt,
        /// Width of `b`.
        b_bitwidth: SymInt,
    },

    /// A modulus was supplied that differs from the canonical one.
    #[error("polynomial {given} is not the canonical modulus {expected} of GF(2^{m})")]
    InconsistentPolynomial {
        /// Field degree.
        m: u32,
        /// The supplied polynomial.
        given: String,
        /// The canonical polynomial for `m`.
        expected: String,
    },

    /// A modulus was supplied for a symbolic degree.
    #[error("cannot check polynomial {given} against symbolic degree {m}")]
    SymbolicFieldDegree {
        /// The symbolic degree.
        m: SymInt,
        /// The supplied polynomial.
        given: String,
    },
}

fn signedness(signed: &bool) -> &'static str {
    if *signed {
        "signed"
    } else {
        "unsigned"
    }
}

/// A wiring graph that does not agree with the signatures it connects.
///
/// Raised while building a decomposition; for the built-in rules this always
/// indicates a defect in the rule rather than in user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureMismatchError {
    /// A connection names a register the signature lacks.
    #[error("`{op}` has no register `{register}`")]
    UnknownRegister {
        /// The operation or boundary being connected.
        op: String,
        /// The unknown name.
        register: String,
    },

    /// A register was connected on the wrong side.
    #[error("register `{register}` of `{op}` is not an {side} register")]
    DirectionMismatch {
        /// The operation or boundary being connected.
        op: String,
        /// The register.
        register: String,
        /// `input` or `output`.
        side: &'static str,
    },

    /// A required register was left unconnected.
    #[error("register `{register}` of `{op}` is not connected")]
    MissingRegister {
        /// The operation or boundary being connected.
        op: String,
        /// The register.
        register: String,
    },

    /// A wire's width differs from the register it feeds.
    #[error("register `{register}` expects {expected} bits, wire {wire} carries {found}")]
    WidthMismatch {
        /// The register.
        register: String,
        /// Register width.
        expected: u32,
        /// Wire width.
        found: u32,
        /// The offending wire.
        wire: String,
    },

    /// The wrong number of wires for a register.
    #[error("register `{register}` expects {expected} wires, got {found}")]
    WireCountMismatch {
        /// The register.
        register: String,
        /// Expected wire count.
        expected: usize,
        /// Supplied wire count.
        found: usize,
    },

    /// A wire was consumed twice, or does not belong to this graph.
    #[error("wire {wire} is already consumed or unknown")]
    WireReused {
        /// The offending wire.
        wire: String,
    },

    /// A wire was produced but never consumed.
    #[error("wire {wire} is never consumed")]
    DanglingWire {
        /// The offending wire.
        wire: String,
    },

    /// A register width that must be concrete is symbolic.
    #[error("register `{register}` has symbolic width {bitwidth}")]
    SymbolicWidth {
        /// The register.
        register: String,
        /// Its width.
        bitwidth: SymInt,
    },

    /// A decomposition's external signature differs from its parent's.
    #[error("decomposition of `{op}` has signature {found}, expected {expected}")]
    SignatureDiffers {
        /// The decomposed operation.
        op: String,
        /// The parent's signature.
        expected: String,
        /// The graph's signature.
        found: String,
    },
}
