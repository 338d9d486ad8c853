//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test bridge servers.
//! Each test gets an isolated server with its own session registry and
//! its own `mcp-echo` child processes.

use super::constants::*;
use mcp_bridge::auth::HttpAuthValidator;
use mcp_bridge::server::{make_app, RequestsLoggingLevel, ServerConfig};
use mcp_bridge::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test bridge instance backed by the `mcp-echo` child binary.
///
/// When dropped, the server gracefully shuts down; echo children die
/// with their sessions (`kill_on_drop`).
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Registry for direct session inspection in tests
    pub registry: Arc<SessionRegistry>,

    // Private field - keeps the server alive until drop
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server whose OAuth validation would hit an
    /// unreachable endpoint. Client token validation works normally
    /// against `TEST_CLIENT_TOKEN_SECRET`.
    pub async fn spawn() -> Self {
        Self::spawn_with_userinfo("http://127.0.0.1:9/v1/userinfo").await
    }

    /// Spawns a test server validating OAuth tokens against the given
    /// userinfo endpoint (usually a stub started by the test).
    pub async fn spawn_with_userinfo(userinfo_endpoint: &str) -> Self {
        let validator = Arc::new(HttpAuthValidator::new(
            userinfo_endpoint,
            Some(TEST_CLIENT_TOKEN_SECRET.to_string()),
        ));
        let registry = Arc::new(SessionRegistry::new(
            validator,
            env!("CARGO_BIN_EXE_mcp-echo"),
            vec![],
            Duration::from_secs(CHILD_CALL_TIMEOUT_SECS),
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            host: "127.0.0.1".to_string(),
            port,
        };
        let app = make_app(config, registry.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            registry,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// WebSocket URL of the bridge endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/v1/mcp/ws", self.port)
    }

    /// Waits for the server to become ready by polling /health
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
