//! Model Context Protocol (MCP) server over stdio.
//!
//! ```text
//! stdin ──▶ Transport ──▶ Server ──▶ ToolRegistry
//!                           │
//! stdout ◀── Transport ◀────┘
//! ```
//!
//! Messages are newline-delimited JSON-RPC 2.0. This implementation targets
//! MCP protocol version 2024-11-05.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::StdioTransport;
