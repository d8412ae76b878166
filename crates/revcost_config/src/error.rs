//! Error types for configuration loading and validation.

use revcost_ir::ConfigurationError;

/// Errors that can occur when loading or resolving a `revcost.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A referenced operation name does not exist in the configuration.
    #[error("unknown operation '{0}'")]
    UnknownOp(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An operation's parameters do not describe a valid node.
    #[error("operation '{op}': {source}")]
    InvalidOp {
        /// The operation name.
        op: String,
        /// What the node constructor rejected.
        source: ConfigurationError,
    },
}
