use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthCapability, AuthError, TokenValidator};
use crate::transport::ProcessTransport;

use super::session::{AuthIdentity, Session};

/// Creates, resolves and destroys sessions.
///
/// One instance is built at startup and shared by every connection.
/// It owns the recipe for spawning child processes (program, args,
/// per-call timeout) and the auth validator consulted at creation time.
pub struct SessionRegistry {
    validator: Arc<dyn TokenValidator>,
    child_command: String,
    child_args: Vec<String>,
    call_timeout: Duration,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        child_command: impl Into<String>,
        child_args: Vec<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            child_command: child_command.into(),
            child_args,
            call_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session, validating the auth capability first. On a
    /// validation failure no session exists and nothing was spawned;
    /// the child process itself starts lazily on the first `send`.
    pub async fn create_session(
        &self,
        capability: Option<AuthCapability>,
    ) -> Result<Arc<Session>, AuthError> {
        let auth = match capability {
            Some(capability) => {
                let user_context = self
                    .validator
                    .validate(capability.auth_type, capability.token.as_deref())
                    .await?;
                Some(AuthIdentity {
                    auth_type: capability.auth_type,
                    token: capability.token,
                    user_context: Some(user_context),
                })
            }
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let transport = ProcessTransport::new(self.child_command.clone(), self.child_args.clone());
        let session = Arc::new(Session::new(
            id.clone(),
            auth,
            Box::new(transport),
            self.call_timeout,
        ));
        self.sessions.write().await.insert(id, session.clone());
        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Remove the session and release its child process. No-op for
    /// unknown ids, so calling it twice is harmless.
    pub async fn destroy_session(&self, id: &str) {
        let session = self.sessions.write().await.remove(id);
        if let Some(session) = session {
            debug!("Destroying session {}", id);
            session.close().await;
        }
    }

    /// Shutdown hook: close every live session. Called once when the
    /// server exits so no child process outlives the bridge.
    pub async fn close_all(&self) {
        let sessions: Vec<Arc<Session>> = self.sessions.write().await.drain().map(|(_, s)| s).collect();
        if !sessions.is_empty() {
            info!("Closing {} session(s)", sessions.len());
        }
        for session in sessions {
            session.close().await;
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
