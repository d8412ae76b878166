//! Parsing and validation of `revcost.toml` project files.
//!
//! A project file names operation nodes under `[ops.<name>]`, gives values to
//! the symbols they use under `[bindings]`, and sets call-graph expansion
//! options under `[costing]`, which each operation may override.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use resolve::{build_bloq, merge_costing, resolve_all, resolve_op, ResolvedOp};
pub use types::*;
