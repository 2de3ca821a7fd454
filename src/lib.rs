//! simple-tools-mcp: a minimal MCP server exposing sample tools over stdio.
//!
//! Four mock tools are served from hard-coded data:
//!
//! - **`add`**: integer addition
//! - **`echo`**: returns the message prefixed with `echo: `
//! - **`kb_search`**: keyword search over a fixed list of documents
//! - **`policy_lookup`**: topic lookup in a fixed policy table
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol implementation
//! - [`tools`] — Tool registry and built-in tools

pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;
