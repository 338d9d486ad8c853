//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for the bridge endpoints.
//!
//! When routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// Header carrying the MCP session id
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

/// HTTP test client for the bridge endpoints
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("health request failed")
    }

    /// POST to /v1/mcp with `Accept: application/json` and no session.
    pub async fn post_mcp(&self, body: &Value) -> Response {
        self.post_mcp_raw("application/json", None, body.to_string())
            .await
    }

    /// POST to /v1/mcp routed into an existing session.
    pub async fn post_mcp_with_session(&self, session_id: &str, body: &Value) -> Response {
        self.post_mcp_raw("application/json", Some(session_id), body.to_string())
            .await
    }

    /// POST to /v1/mcp with full control over accept, session and body.
    pub async fn post_mcp_raw(
        &self,
        accept: &str,
        session_id: Option<&str>,
        body: String,
    ) -> Response {
        let mut request = self
            .client
            .post(format!("{}/v1/mcp", self.base_url))
            .header("accept", accept)
            .header("content-type", "application/json")
            .body(body);
        if let Some(id) = session_id {
            request = request.header(SESSION_ID_HEADER, id);
        }
        request.send().await.expect("mcp request failed")
    }

    /// GET /v1/mcp as an event stream over an existing session.
    pub async fn get_mcp_sse(&self, session_id: Option<&str>) -> Response {
        let mut request = self
            .client
            .get(format!("{}/v1/mcp", self.base_url))
            .header("accept", "text/event-stream");
        if let Some(id) = session_id {
            request = request.header(SESSION_ID_HEADER, id);
        }
        request.send().await.expect("sse request failed")
    }

    /// Standard initialize handshake without auth. Panics on failure,
    /// returns the new session id and the child's reply.
    pub async fn initialize(&self) -> (String, Value) {
        let response = self
            .post_mcp(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {"capabilities": {}},
            }))
            .await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "initialize failed"
        );
        let session_id = response
            .headers()
            .get(SESSION_ID_HEADER)
            .expect("missing session id header")
            .to_str()
            .expect("invalid session id header")
            .to_string();
        let body: Value = response.json().await.expect("initialize reply not JSON");
        (session_id, body)
    }

    /// Initialize declaring an auth capability. Returns the raw
    /// response so tests can assert on failures too.
    pub async fn initialize_with_auth(&self, auth: Value) -> Response {
        self.post_mcp(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"capabilities": {"auth": auth}},
        }))
        .await
    }
}
