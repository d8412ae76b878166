//! Simulation error types.

use revcost_decompose::DecomposeError;
use revcost_ir::ConfigurationError;

/// Errors that can occur while simulating a node or wiring graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// A composite could not be decomposed.
    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    /// A gate was built with invalid parameters.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// An input register was not supplied.
    #[error("{op}: missing value for input register `{register}`")]
    MissingInput {
        /// The node or graph being simulated.
        op: String,
        /// The register.
        register: String,
    },

    /// A value was supplied for a register that is not an input.
    #[error("{op}: `{register}` is not an input register")]
    UnexpectedInput {
        /// The node or graph being simulated.
        op: String,
        /// The register.
        register: String,
    },

    /// A supplied value has the wrong width.
    #[error("{op}: register `{register}` is {expected} bits wide, got {found}")]
    WidthMismatch {
        /// The node or graph being simulated.
        op: String,
        /// The register.
        register: String,
        /// Declared width.
        expected: u32,
        /// Width of the supplied value.
        found: u32,
    },

    /// An `And†` found a target that is not the AND of its controls.
    #[error("And† target is {target} but controls give {expected}")]
    UncomputeMismatch {
        /// The target bit seen.
        target: bool,
        /// `ctrl0 & ctrl1`.
        expected: bool,
    },

    /// A register was freed while holding a nonzero value.
    #[error("freed register holds nonzero value {value}")]
    DirtyFree {
        /// The offending value, most significant bit first.
        value: String,
    },

    /// An out-of-place adder was uncomputed with a sum register that does not
    /// hold `a + b`.
    #[error("{op}: sum register holds {found}, expected {expected}")]
    InconsistentUncompute {
        /// The node being simulated.
        op: String,
        /// The value `c` should hold.
        expected: String,
        /// The value `c` holds.
        found: String,
    },

    /// A node has symbolic parameters.
    #[error("{bloq} has symbolic parameters and cannot be simulated")]
    Symbolic {
        /// Display form of the node.
        bloq: String,
    },

    /// No direct arithmetic semantics exist for the node.
    #[error("no reference semantics for {bloq}")]
    NoReference {
        /// Display form of the node.
        bloq: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = SimError::UncomputeMismatch {
            target: true,
            expected: false,
        };
        assert_eq!(e.to_string(), "And† target is true but controls give false");
        let e = SimError::DirtyFree { value: "0100".into() };
        assert_eq!(e.to_string(), "freed register holds nonzero value 0100");
        let e = SimError::MissingInput {
            op: "Add(a=4, b=4)".into(),
            register: "b".into(),
        };
        assert_eq!(e.to_string(), "Add(a=4, b=4): missing value for input register `b`");
    }
}
