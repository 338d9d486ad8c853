use anyhow::Result;
use std::sync::Arc;

use tracing::info;

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::session::SessionRegistry;

use super::gateway::{health, mcp_endpoint, SESSION_ID_HEADER};
use super::websocket::ws_handler;
use super::{log_requests, state::*, ServerConfig};

pub fn make_app(config: ServerConfig, registry: Arc<SessionRegistry>) -> Router {
    let state = ServerState { config, registry };

    let mcp_routes: Router = Router::new()
        .route("/mcp", post(mcp_endpoint).get(mcp_endpoint))
        .route("/mcp/ws", get(ws_handler))
        .with_state(state.clone());

    // Browser clients need to read the session id off the initialize
    // response, so it is explicitly exposed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)]);

    let mut app: Router = Router::new()
        .route("/health", get(health))
        .nest("/v1", mcp_routes);
    app = app.layer(cors);
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    app
}

pub async fn run_server(config: ServerConfig, registry: Arc<SessionRegistry>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = make_app(config, registry);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Ok(axum::serve(listener, app).await?)
}
