//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ConfigValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
}

/// A validated configuration together with the parsed document it came from.
///
/// The document is kept so later reloads can compare by parsed equality.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub document: Value,
    pub config: GatewayConfig,
}

/// Parse YAML source text into a raw document tree.
pub fn parse_document(source: &str) -> Result<Value, ConfigError> {
    Ok(serde_yaml::from_str::<Value>(source)?)
}

/// Parse and validate YAML source text.
pub fn parse_config(source: &str) -> Result<LoadedConfig, ConfigError> {
    let document = parse_document(source)?;
    let config = validate_config(&document)?;
    Ok(LoadedConfig { document, config })
}

/// Load and validate configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&source)
}
