//! Tool registry and the built-in sample tools.
//!
//! - [`registry`] — named handlers with parameter schemas and argument checks
//! - [`builtin`] — `add`, `echo`, `kb_search`, `policy_lookup`
//! - [`fixtures`] — the static documents and policies they read

pub mod builtin;
pub mod fixtures;
pub mod registry;

pub use registry::{
    ParamSpec, ParamType, ToolArguments, ToolDefinition, ToolHandler, ToolOutput, ToolRegistry,
};

use crate::error::ToolResult;

/// Builds a registry holding the built-in tools.
///
/// # Errors
///
/// Only fails if the built-in tool names collide, which would be a
/// programming error.
pub fn builtin_registry() -> ToolResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    builtin::register_builtins(&mut registry)?;
    Ok(registry)
}
