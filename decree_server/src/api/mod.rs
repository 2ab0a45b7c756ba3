//! HTTP/WebSocket API for TheDecree server.
//!
//! # Architecture
//!
//! - **Axum**: async web framework for HTTP/WebSocket
//! - **Tower**: middleware for CORS and request correlation
//! - **Hub**: the single source of truth for rooms and connections, shared
//!   across all handlers behind an `Arc`
//!
//! # Endpoints
//!
//! - `GET /health` - liveness/readiness check
//! - `GET /stats` - per-room summary (player counts, game mode, state)
//! - `GET /ws` - WebSocket upgrade; all gameplay happens over this socket
//!
//! There is no REST surface for room/game actions — a client creates or
//! joins a room and plays entirely through WebSocket messages.

pub mod request_id;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use decree_engine::Hub;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/ws", get(websocket::websocket_handler))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let connection_count = state.hub.connection_count().await;
    let room_count = state.hub.room_count().await;

    let response = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": connection_count,
        "rooms": room_count,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}

/// Per-room summary for monitoring dashboards.
async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.hub.stats().await;
    let players: usize = rooms.iter().map(|r| r.player_count).sum();
    let room_details: Vec<_> = rooms
        .iter()
        .map(|r| json!({ "id": r.room_id, "playerCount": r.player_count, "state": r.state }))
        .collect();

    Json(json!({
        "rooms": rooms.len(),
        "players": players,
        "roomDetails": room_details,
    }))
}
