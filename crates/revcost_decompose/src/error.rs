//! Error types for decomposition.

use revcost_ir::{Bloq, ConfigurationError, SignatureMismatchError};

/// Errors that can occur while decomposing an operation node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecomposeError {
    /// The node's parameters are invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A decomposition rule produced a graph that does not match the node.
    #[error("decomposition of {bloq} is inconsistent: {source}")]
    SignatureMismatch {
        /// Display form of the decomposed node.
        bloq: String,
        /// What was inconsistent.
        source: SignatureMismatchError,
    },

    /// The node has symbolic parameters, so no concrete wiring graph exists.
    #[error("{bloq} has symbolic parameters and cannot be wired")]
    Symbolic {
        /// Display form of the node.
        bloq: String,
    },
}

/// Failure inside a rule, before the failing node is known.
#[derive(Debug)]
pub(crate) enum RuleError {
    Configuration(ConfigurationError),
    Mismatch(SignatureMismatchError),
    Symbolic,
}

impl From<ConfigurationError> for RuleError {
    fn from(e: ConfigurationError) -> Self {
        RuleError::Configuration(e)
    }
}

impl From<SignatureMismatchError> for RuleError {
    fn from(e: SignatureMismatchError) -> Self {
        RuleError::Mismatch(e)
    }
}

impl RuleError {
    pub(crate) fn at(self, bloq: &Bloq) -> DecomposeError {
        match self {
            RuleError::Configuration(e) => DecomposeError::Configuration(e),
            RuleError::Mismatch(source) => DecomposeError::SignatureMismatch {
                bloq: bloq.to_string(),
                source,
            },
            RuleError::Symbolic => DecomposeError::Symbolic { bloq: bloq.to_string() },
        }
    }
}

pub(crate) type RuleResult<T> = Result<T, RuleError>;
