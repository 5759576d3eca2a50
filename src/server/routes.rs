//! Route handlers for the collaborative editing server.
//!
//! This module contains the HTTP route handlers, the shared application
//! state and the router construction.

use axum::{
    Router,
    extract::{State, ws::WebSocketUpgrade},
    response::{Json, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::server::websocket::handle_websocket_connection;
use crate::sync::SharedEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub outbox_capacity: usize,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: SharedEngine, outbox_capacity: usize) -> Self {
        AppState {
            engine,
            outbox_capacity,
            started_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub participants: usize,
    pub pending: usize,
    pub revision: usize,
    pub document_length: usize,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

/// Basic health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.engine.lock().stats();
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
        participants: stats.participants,
        pending: stats.pending,
        revision: stats.revision,
        document_length: stats.document_length,
        started_at: state.started_at,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// WebSocket connection handler for collaborative editing
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    debug!("upgrading editor connection");
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state))
}

/// Creates and configures the main application router, serving the editor
/// socket at `editor_path`.
pub fn create_router(state: AppState, editor_path: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(editor_path, get(ws_handler))
        .with_state(state)
}
