//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{OpSpec, ProjectConfig};
use std::path::Path;

/// The configuration file name looked up in a project directory.
pub const CONFIG_FILE: &str = "revcost.toml";

/// Loads and validates `revcost.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks the values serde cannot: names, depths and polynomial exponents.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.costing.max_depth == Some(0) {
        return Err(ConfigError::ValidationError("costing.max_depth must be positive".to_string()));
    }
    for (name, op) in &config.ops {
        if op.costing.max_depth == Some(0) {
            return Err(ConfigError::ValidationError(format!(
                "ops.{name}.costing.max_depth must be positive"
            )));
        }
        if let OpSpec::Gf2Multiplication {
            polynomial: Some(exponents),
            ..
        } = &op.spec
        {
            if exponents.is_empty() || exponents.iter().any(|&e| e > 64) {
                return Err(ConfigError::ValidationError(format!(
                    "ops.{name}.polynomial must list exponents between 0 and 64"
                )));
            }
        }
    }
    for (symbol, value) in &config.bindings {
        if *value < 0 {
            return Err(ConfigError::ValidationError(format!(
                "binding {symbol} = {value} must not be negative"
            )));
        }
    }
    Ok(())
}
