//! The HTTP side of the bridge: `/health` and the `/v1/mcp` endpoint.
//!
//! `/v1/mcp` negotiates on the `Accept` header. A JSON accept gives the
//! request/response flow (with `initialize` interception for session
//! creation); an event-stream accept opens a one-way SSE read over an
//! existing session. Anything else is 406.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::AuthError;
use crate::mcp::protocol::{McpError, McpRequest, McpResponse, RequestId};
use crate::session::{Session, SessionRegistry};

use super::state::GuardedSessionRegistry;

/// Header carrying the session id, both on the `initialize` response
/// and on every routed request.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

/// `POST`/`GET /v1/mcp`. The body is taken raw so that malformed JSON
/// stays inside the JSON-RPC error path instead of axum's rejection.
pub async fn mcp_endpoint(
    State(registry): State<GuardedSessionRegistry>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if accept.contains("application/json") {
        handle_json(registry, session_id, &body).await
    } else if accept.contains("text/event-stream") {
        handle_sse(registry, session_id).await
    } else {
        debug!("Unsupported Accept header: {:?}", accept);
        StatusCode::NOT_ACCEPTABLE.into_response()
    }
}

async fn handle_json(
    registry: GuardedSessionRegistry,
    session_id: Option<String>,
    body: &[u8],
) -> Response {
    let request: McpRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => {
            debug!("Failed to parse request body: {}", err);
            return error_response(
                StatusCode::BAD_REQUEST,
                None,
                McpError::ParseError("Parse error".to_string()),
            );
        }
    };
    let request_id = request.id.clone();

    // A fresh initialize (no session header) creates the session; an
    // initialize replayed into an existing session is routed like any
    // other request.
    if request.is_initialize() && session_id.is_none() {
        return match initialize_session(&registry, request).await {
            Ok((session, reply)) => {
                let mut response = Json(reply).into_response();
                if let Ok(value) = HeaderValue::from_str(session.id()) {
                    response.headers_mut().insert(SESSION_ID_HEADER, value);
                }
                response
            }
            Err(message) => error_response(
                StatusCode::UNAUTHORIZED,
                request_id,
                McpError::Unauthorized(message),
            ),
        };
    }

    let session = match &session_id {
        Some(id) => registry.get_session(id).await,
        None => None,
    };
    let Some(session) = session else {
        return error_response(StatusCode::NOT_FOUND, request_id, McpError::SessionNotFound);
    };

    match session.send(request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => error_response(
            StatusCode::UNAUTHORIZED,
            request_id,
            McpError::Unauthorized(err.to_string()),
        ),
    }
}

/// Validate the declared capability, create the session and complete
/// the handshake with the child. On failure the error message surfaces
/// in a -32001 reply.
async fn initialize_session(
    registry: &SessionRegistry,
    request: McpRequest,
) -> Result<(Arc<Session>, Value), String> {
    let capability = request
        .auth_capability()
        .map_err(|err| capability_error(&request, err).to_string())?;
    let session = registry
        .create_session(capability)
        .await
        .map_err(|err| err.to_string())?;
    match session.send(request).await {
        Ok(reply) => Ok((session, reply)),
        Err(err) => {
            // Half-open session is useless, drop it right away.
            registry.destroy_session(session.id()).await;
            Err(err.to_string())
        }
    }
}

/// Distinguish a capability that names an auth type the bridge does
/// not speak from one that is malformed in some other way. The two
/// carry different messages on the wire.
fn capability_error(request: &McpRequest, err: serde_json::Error) -> AuthError {
    let declared = request
        .params
        .as_ref()
        .and_then(|params| params.get("capabilities"))
        .and_then(|capabilities| capabilities.get("auth"))
        .and_then(|auth| auth.get("type"))
        .and_then(Value::as_str);
    match declared {
        Some(auth_type) if auth_type != "OAUTH" && auth_type != "CLIENT_TOKEN" => {
            AuthError::Unsupported(auth_type.to_string())
        }
        _ => AuthError::InvalidCapability(err.to_string()),
    }
}

/// One-way event stream over an existing session. The request body is
/// ignored; lines the child emits are forwarded verbatim as SSE data
/// events until the first read failure ends the stream.
async fn handle_sse(registry: GuardedSessionRegistry, session_id: Option<String>) -> Response {
    let Some(session_id) = session_id else {
        return (StatusCode::BAD_REQUEST, "Session ID required for SSE").into_response();
    };
    let Some(session) = registry.get_session(&session_id).await else {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    let stream = stream::unfold(session, |session| async move {
        match session.read_next().await {
            Ok(line) => Some((
                Ok::<Event, Infallible>(Event::default().data(line)),
                session,
            )),
            Err(err) => {
                debug!("Event stream for session {} ended: {}", session.id(), err);
                None
            }
        }
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(SSE_KEEP_ALIVE_INTERVAL))
        .into_response()
}

fn error_response(
    status: StatusCode,
    id: Option<RequestId>,
    error: McpError,
) -> Response {
    (status, Json(McpResponse::error(id, error))).into_response()
}
