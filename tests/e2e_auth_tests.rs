//! End-to-end tests for the auth handshake: OAuth introspection against
//! a stub userinfo endpoint, client tokens against the shared secret,
//! and the `_meta.auth` injection that follows a validated initialize.

mod common;

use axum::http::{HeaderMap, StatusCode as AxumStatusCode};
use axum::{routing::get, Json, Router};
use common::{TestClient, TestServer, TEST_CLIENT_TOKEN_SECRET, TEST_OAUTH_EMAIL, TEST_OAUTH_TOKEN};
use mcp_bridge::auth::client_token::create_client_token;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Stub userinfo endpoint: accepts exactly `TEST_OAUTH_TOKEN` as bearer.
async fn spawn_userinfo_stub() -> String {
    async fn userinfo(headers: HeaderMap) -> Result<Json<Value>, AxumStatusCode> {
        let authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if authorization == format!("Bearer {}", TEST_OAUTH_TOKEN) {
            Ok(Json(json!({"email": TEST_OAUTH_EMAIL})))
        } else {
            Err(AxumStatusCode::UNAUTHORIZED)
        }
    }

    let app = Router::new().route("/v1/userinfo", get(userinfo));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind userinfo stub");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub failed");
    });
    format!("http://{}/v1/userinfo", addr)
}

/// Routes an echo request through the session and returns the
/// `_meta.auth` object the bridge injected into its params.
async fn injected_auth_meta(client: &TestClient, session_id: &str) -> Value {
    let response = client
        .post_mcp_with_session(
            session_id,
            &json!({"jsonrpc": "2.0", "id": 2, "method": "echo", "params": {}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["result"]["params"]["_meta"]["auth"].clone()
}

#[tokio::test]
async fn oauth_token_is_validated_and_injected_into_meta() {
    let userinfo = spawn_userinfo_stub().await;
    let server = TestServer::spawn_with_userinfo(&userinfo).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .initialize_with_auth(json!({"type": "OAUTH", "token": TEST_OAUTH_TOKEN}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = response
        .headers()
        .get(common::SESSION_ID_HEADER)
        .expect("missing session id header")
        .to_str()
        .unwrap()
        .to_string();

    let auth = injected_auth_meta(&client, &session_id).await;
    assert_eq!(auth["type"], json!("oauth"));
    assert_eq!(auth["token"], json!(TEST_OAUTH_TOKEN));
    assert_eq!(auth["user_context"]["email"], json!(TEST_OAUTH_EMAIL));
}

#[tokio::test]
async fn rejected_oauth_token_yields_401_and_no_session() {
    let userinfo = spawn_userinfo_stub().await;
    let server = TestServer::spawn_with_userinfo(&userinfo).await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .initialize_with_auth(json!({"type": "OAUTH", "token": "wrong-token"}))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["error"]["code"], json!(-32001));
    assert_eq!(
        body["error"]["message"],
        json!("Failed to validate token: 401")
    );
    assert_eq!(server.registry.session_count().await, 0);
}

#[tokio::test]
async fn client_token_is_validated_and_injected_into_meta() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let token = create_client_token(
        TEST_CLIENT_TOKEN_SECRET,
        json!({"email": "minted@example.com"}),
        600,
    )
    .unwrap();

    let response = client
        .initialize_with_auth(json!({"type": "CLIENT_TOKEN", "token": token}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = response
        .headers()
        .get(common::SESSION_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let auth = injected_auth_meta(&client, &session_id).await;
    assert_eq!(auth["type"], json!("client_token"));
    assert_eq!(
        auth["user_context"]["email"],
        json!("minted@example.com")
    );
}

#[tokio::test]
async fn expired_client_token_yields_401() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let token = create_client_token(TEST_CLIENT_TOKEN_SECRET, json!({}), -600).unwrap();
    let response = client
        .initialize_with_auth(json!({"type": "CLIENT_TOKEN", "token": token}))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32001));
    assert_eq!(body["error"]["message"], json!("Token has expired"));
}

#[tokio::test]
async fn client_token_signed_with_the_wrong_secret_yields_401() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let token = create_client_token("some-other-secret", json!({}), 600).unwrap();
    let response = client
        .initialize_with_auth(json!({"type": "CLIENT_TOKEN", "token": token}))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32001));
}

#[tokio::test]
async fn capability_without_a_token_yields_401() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .initialize_with_auth(json!({"type": "OAUTH"}))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32001));
    assert_eq!(body["error"]["message"], json!("No token provided"));
}

#[tokio::test]
async fn unknown_auth_type_yields_401() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .initialize_with_auth(json!({"type": "BASIC", "token": "x"}))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32001));
    assert_eq!(
        body["error"]["message"],
        json!("Unsupported authentication type: BASIC")
    );
}

#[tokio::test]
async fn anonymous_session_injects_null_auth_meta() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let (session_id, _) = client.initialize().await;

    let auth = injected_auth_meta(&client, &session_id).await;
    assert_eq!(auth["type"], Value::Null);
    assert_eq!(auth["token"], Value::Null);
    assert_eq!(auth["user_context"], Value::Null);
}
