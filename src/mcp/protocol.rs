//! JSON-RPC 2.0 envelope types for the MCP wire protocol.
//!
//! Only the envelope is modeled here: the bridge inspects `method` (to
//! intercept `initialize`) and `params.capabilities.auth`, and echoes
//! `id` back in its own error replies. Child replies are forwarded as
//! raw `serde_json::Value`, never re-validated against these types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthCapability;

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// Core Message Types
// ============================================================================

/// Incoming request from an MCP client.
///
/// Re-serialized verbatim (plus injected auth metadata) when forwarded
/// to the child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    // Params must be a JSON object when present; array params are a
    // parse error, same as the upstream envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

impl McpRequest {
    pub fn is_initialize(&self) -> bool {
        self.method == methods::INITIALIZE
    }

    /// Extract the auth capability declared in an `initialize` request
    /// (`params.capabilities.auth`). Returns `Ok(None)` when absent,
    /// and an error when present but malformed.
    pub fn auth_capability(&self) -> Result<Option<AuthCapability>, serde_json::Error> {
        if !self.is_initialize() {
            return Ok(None);
        }
        let auth = self
            .params
            .as_ref()
            .and_then(|p| p.get("capabilities"))
            .and_then(|capabilities| capabilities.get("auth"));
        match auth {
            Some(value) if !value.is_null() => {
                serde_json::from_value::<AuthCapability>(value.clone()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

/// Bridge-generated response envelope.
///
/// Used only for errors the bridge produces itself; successful replies
/// come from the child process and keep whatever shape it emitted.
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    // Serialized even when None: JSON-RPC error replies carry `id: null`
    // when the request id could not be determined.
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpErrorResponse>,
}

impl McpResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Request ID can be string or number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// Error response structure
#[derive(Debug, Clone, Serialize)]
pub struct McpErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// Error Codes
// ============================================================================

/// The error vocabulary the bridge speaks on the wire.
///
/// Messages are carried verbatim: auth failures surface the validator's
/// text, parse errors carry whatever detail the failing path produced.
#[derive(Debug, Clone)]
pub enum McpError {
    ParseError(String),
    SessionNotFound,
    Unauthorized(String),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => -32700,
            McpError::SessionNotFound => -32000,
            McpError::Unauthorized(_) => -32001,
        }
    }

    pub fn message(&self) -> String {
        match self {
            McpError::ParseError(msg) => msg.clone(),
            McpError::SessionNotFound => "Invalid or expired session".to_string(),
            McpError::Unauthorized(msg) => msg.clone(),
        }
    }
}

impl From<McpError> for McpErrorResponse {
    fn from(err: McpError) -> Self {
        McpErrorResponse {
            code: err.code(),
            message: err.message(),
            data: None,
        }
    }
}

// ============================================================================
// MCP Method Names
// ============================================================================

pub mod methods {
    pub const INITIALIZE: &str = "initialize";
}
