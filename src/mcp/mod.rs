//! MCP (Model Context Protocol) envelope types.
//!
//! The bridge does not implement any MCP methods itself; it only needs
//! the JSON-RPC envelope to route messages, intercept `initialize`, and
//! build its own error replies. Everything the child process returns is
//! passed through verbatim.

pub mod protocol;

pub use protocol::{McpError, McpRequest, McpResponse, RequestId};
