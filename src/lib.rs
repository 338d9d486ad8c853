//! MCP Bridge Server Library
//!
//! This library exposes the internal modules for the integration tests
//! and the companion binaries.

pub mod auth;
pub mod config;
pub mod mcp;
pub mod server;
pub mod session;
pub mod transport;

// Re-export commonly used types for convenience
pub use server::{run_server, RequestsLoggingLevel};
pub use session::SessionRegistry;
pub use transport::ProcessTransport;
