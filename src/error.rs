//! Error types for simple-tools-mcp.
//!
//! Tool errors are local to a single invocation. The MCP layer turns them
//! into error results for the caller; the registry stays usable afterwards.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Result type for tool registration and invocation.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised by the tool registry and its handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The call references a tool that was never registered.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// An argument is missing, has the wrong type, or is out of range.
    #[error("Invalid argument '{name}': {message}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },

    /// A tool with the same name is already registered.
    #[error("Tool already registered: {name}")]
    DuplicateName {
        /// The clashing tool name.
        name: String,
    },
}

impl ToolError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }
}
