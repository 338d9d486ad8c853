//! WebSocket transport: one implicit session per connection.
//!
//! No session header here. The session is created when the socket is
//! accepted (anonymous, since no capability travels with the upgrade)
//! and destroyed when the socket closes. A malformed or failing frame
//! gets an error frame back but never kills the connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tracing::{debug, error};

use crate::mcp::protocol::{McpError, McpRequest, McpResponse};
use crate::session::Session;

use super::state::GuardedSessionRegistry;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<GuardedSessionRegistry>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

async fn handle_socket(socket: WebSocket, registry: GuardedSessionRegistry) {
    let session = match registry.create_session(None).await {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to create WebSocket session: {}", err);
            return;
        }
    };
    debug!("WebSocket connected, session {}", session.id());

    let (mut sink, mut stream) = socket.split();

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                debug!("WebSocket error on session {}: {}", session.id(), err);
                break;
            }
        };
        match message {
            Message::Text(text) => {
                let reply = handle_frame(&session, text.as_str()).await;
                let frame = match serde_json::to_string(&reply) {
                    Ok(frame) => frame,
                    Err(err) => {
                        error!("Failed to serialize reply frame: {}", err);
                        continue;
                    }
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part
            // of the protocol and are dropped.
            _ => {}
        }
    }

    debug!("WebSocket disconnected, session {}", session.id());
    registry.destroy_session(session.id()).await;
}

/// One frame, one reply. Failures of any kind become an error frame
/// with the failure's own message; the id is null because a reply to a
/// frame that never parsed (or never got a child response) has no id
/// to echo.
async fn handle_frame(session: &Session, text: &str) -> Value {
    let request: McpRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(err) => return error_frame(err.to_string()),
    };
    match session.send(request).await {
        Ok(reply) => reply,
        Err(err) => error_frame(err.to_string()),
    }
}

fn error_frame(message: String) -> Value {
    serde_json::to_value(McpResponse::error(None, McpError::ParseError(message)))
        .unwrap_or_default()
}
