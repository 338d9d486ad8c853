//! Authentication for session creation.
//!
//! Two schemes, mirroring the upstream identity flows: OAuth bearer
//! tokens validated against a userinfo endpoint, and locally-issued
//! HS256 client tokens validated against a shared secret. Validation
//! happens once per session at creation; the resolved user context is
//! then injected into every forwarded message as `_meta.auth`.

pub mod cache;
pub mod client_token;
mod validator;

pub use validator::{HttpAuthValidator, TokenValidator, DEFAULT_USERINFO_ENDPOINT};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identity payload returned by a validator. The bridge never
/// interprets it; the child process does.
pub type UserContext = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthType {
    #[serde(rename = "OAUTH")]
    Oauth,
    ClientToken,
}

impl AuthType {
    /// Lowercase form used in the injected `_meta.auth.type` field.
    pub fn meta_str(&self) -> &'static str {
        match self {
            AuthType::Oauth => "oauth",
            AuthType::ClientToken => "client_token",
        }
    }
}

/// Auth declaration carried in `initialize` under `capabilities.auth`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthCapability {
    #[serde(rename = "type")]
    pub auth_type: AuthType,
    #[serde(default)]
    pub token: Option<String>,
}

/// Authentication failures. Messages surface verbatim in -32001 error
/// replies, so their wording is part of the wire behavior.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to validate token: {0}")]
    ValidationFailed(String),
    #[error("Token has expired")]
    Expired,
    #[error("Invalid client token: {0}")]
    InvalidToken(String),
    #[error("No token provided")]
    MissingToken,
    #[error("Unsupported authentication type: {0}")]
    Unsupported(String),
    #[error("Invalid auth capability: {0}")]
    InvalidCapability(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
