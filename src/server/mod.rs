//! Web server module for the collaborative editing service.
//!
//! This module contains the Axum router, the health endpoint and the
//! per-connection WebSocket session that feeds the synchronization engine.

pub mod routes;
pub mod websocket;

// Re-export main server functionality
pub use routes::*;
pub use websocket::{WebSocketSession, handle_websocket_connection};
