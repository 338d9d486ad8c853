use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::{AuthType, UserContext};
use crate::mcp::protocol::McpRequest;
use crate::transport::{LineTransport, TransportError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is closed")]
    Closed,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed protocol message: {0}")]
    Protocol(#[source] serde_json::Error),
}

/// Identity resolved once at session creation and propagated to the
/// child on every call via `_meta.auth`.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub auth_type: AuthType,
    pub token: Option<String>,
    pub user_context: Option<UserContext>,
}

/// One logical MCP session: an id, an optional identity, and exclusive
/// ownership of one child transport.
///
/// All transport access goes through one async mutex, so concurrent
/// `send` calls on the same session queue up FIFO and a request's reply
/// can never be claimed by another caller. Different sessions share
/// nothing and never wait on each other.
///
/// The same mutex means an open event stream (`read_next`) blocks a
/// concurrent `send` on its session for up to `call_timeout`. And a
/// read that times out closes the session: the cancelled read may have
/// torn a line, and a late reply may still arrive, so nothing read
/// after it could be matched to its caller.
pub struct Session {
    id: String,
    auth: Option<AuthIdentity>,
    created_at: DateTime<Utc>,
    call_timeout: Duration,
    inner: Mutex<SessionInner>,
}

struct SessionInner {
    transport: Box<dyn LineTransport>,
    closed: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("auth", &self.auth)
            .field("created_at", &self.created_at)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        id: String,
        auth: Option<AuthIdentity>,
        transport: Box<dyn LineTransport>,
        call_timeout: Duration,
    ) -> Self {
        debug!(
            "Created session {} (auth: {:?})",
            id,
            auth.as_ref().map(|a| a.auth_type)
        );
        Self {
            id,
            auth,
            created_at: Utc::now(),
            call_timeout,
            inner: Mutex::new(SessionInner {
                transport,
                closed: false,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn auth(&self) -> Option<&AuthIdentity> {
        self.auth.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// One full round trip: write the request as a line, read one reply
    /// line, parse it. The child's reply is returned verbatim as JSON;
    /// the bridge does not validate its shape.
    pub async fn send(&self, mut request: McpRequest) -> Result<Value, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SessionError::Closed);
        }

        self.inject_auth_meta(&mut request);
        let line = serde_json::to_string(&request).map_err(SessionError::Protocol)?;
        debug!("Session {} sending: {}", self.id, line);

        inner.transport.write_line(&line).await?;
        let reply = read_with_timeout(&mut inner, self.call_timeout).await?;
        debug!("Session {} received: {}", self.id, reply);

        serde_json::from_str(&reply).map_err(SessionError::Protocol)
    }

    /// One raw line from the child, for the SSE stream. Not parsed: the
    /// stream forwards whatever the child emitted.
    pub async fn read_next(&self) -> Result<String, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SessionError::Closed);
        }
        read_with_timeout(&mut inner, self.call_timeout).await
    }

    /// Attach `_meta.auth` to the outgoing params. Skipped for
    /// `initialize` (the capability was just validated) and for
    /// requests without params. An existing `_meta` object keeps its
    /// other keys.
    fn inject_auth_meta(&self, request: &mut McpRequest) {
        if request.is_initialize() {
            return;
        }
        let Some(params) = request.params.as_mut() else {
            return;
        };

        let auth_value = match &self.auth {
            Some(identity) => json!({
                "type": identity.auth_type.meta_str(),
                "token": identity.token,
                "user_context": identity.user_context,
            }),
            None => json!({
                "type": null,
                "token": null,
                "user_context": null,
            }),
        };

        let meta = params.entry("_meta".to_string()).or_insert_with(|| json!({}));
        match meta.as_object_mut() {
            Some(meta_obj) => {
                meta_obj.insert("auth".to_string(), auth_value);
            }
            None => *meta = json!({ "auth": auth_value }),
        }
    }

    /// Close the session and release the child process. Idempotent;
    /// later `send`/`read_next` calls fail with `SessionError::Closed`.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.closed = true;
        debug!("Closing session {}", self.id);
        inner.transport.close().await;
    }
}

async fn read_with_timeout(
    inner: &mut SessionInner,
    call_timeout: Duration,
) -> Result<String, SessionError> {
    match tokio::time::timeout(call_timeout, inner.transport.read_line()).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            // The cancelled read may have consumed part of a line, and
            // a late reply may still be owed on the pipe. The stream
            // position no longer matches any caller, so the session is
            // closed here: the next call must fail rather than read a
            // reply that belongs to this one.
            inner.closed = true;
            inner.transport.close().await;
            Err(SessionError::Transport(TransportError::Timeout))
        }
    }
}
