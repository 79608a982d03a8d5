//! Axum router: the WebSocket endpoint, the admin JSON API, and health.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Query, State};
use axum::response::Response;
use axum::routing::get;

use crate::server::TrivionServer;

use super::api;
use super::connection::handle_socket;

/// Build the router with CORS configuration.
pub fn create_router(cors_origins: &str) -> axum::Router<Arc<TrivionServer>> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    axum::Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// WebSocket handler. An optional `?room=CODE` query presets the room used
/// by `join_room` frames that omit a code.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(server): State<Arc<TrivionServer>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let url_room = params
        .get("room")
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty());
    ws.on_upgrade(move |socket| handle_socket(socket, server, addr, url_room))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
