//! Configuration file loading and parsing.
//!
//! The configuration file is optional and only read when its path is given
//! on the command line. Without one, built-in defaults are used and nothing
//! is read from disk.

mod settings;

pub use settings::{Config, LoggingConfig, ServerConfig};

use std::path::Path;

use crate::error::ConfigError;

/// Loads and parses the configuration file.
///
/// If `path` is `None`, returns the built-in defaults.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file cannot be read
/// - The JSON is malformed
/// - A field fails validation
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(config_path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    if !config_path.exists() {
        return Err(ConfigError::NotFound {
            path: config_path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}
