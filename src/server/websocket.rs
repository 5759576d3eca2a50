//! WebSocket session management for collaborative editing.
//!
//! This module handles WebSocket connections: it registers each socket with
//! the synchronization engine, feeds inbound frames to it, and drains the
//! connection's outbox back onto the socket.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::SyncError;
use crate::protocol::ServerMessage;
use crate::server::routes::AppState;
use crate::sync::{Outbox, SessionId};

/// WebSocket session manager
pub struct WebSocketSession {
    socket: WebSocket,
    state: AppState,
    session_id: SessionId,
    outbound: mpsc::Receiver<ServerMessage>,
}

impl WebSocketSession {
    /// Create a new WebSocket session
    pub fn new(
        socket: WebSocket,
        state: AppState,
        session_id: SessionId,
        outbound: mpsc::Receiver<ServerMessage>,
    ) -> Self {
        Self {
            socket,
            state,
            session_id,
            outbound,
        }
    }

    /// Handle the WebSocket connection lifecycle
    pub async fn handle(self) {
        let WebSocketSession {
            socket,
            state,
            session_id,
            mut outbound,
        } = self;
        let (mut sink, mut stream) = socket.split();

        info!(session = %session_id, "websocket session established");

        loop {
            tokio::select! {
                message = outbound.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    let json = match message.encode() {
                        Ok(json) => json,
                        Err(e) => {
                            error!(session = %session_id, kind = message.kind(), "failed to encode message: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        warn!(session = %session_id, "failed to send message: {}", e);
                        break;
                    }
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            handle_text_message(&state, session_id, &text);
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!(session = %session_id, "websocket session closed by client");
                            break;
                        }
                        Some(Ok(_)) => {
                            // Binary and control frames; pings are answered by the socket itself
                        }
                        Some(Err(e)) => {
                            warn!(session = %session_id, "websocket error: {}", e);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        state.engine.lock().disconnect(session_id);
        info!(session = %session_id, "websocket session ended");
    }
}

/// Hands one inbound text frame to the engine and logs anything it rejects.
fn handle_text_message(state: &AppState, session_id: SessionId, text: &str) {
    debug!(session = %session_id, "received: {}", text);

    let result = state.engine.lock().handle_text(session_id, text);
    match result {
        Ok(()) => {}
        Err(SyncError::UnknownSession(_)) => {
            debug!(session = %session_id, "message for a session that already left");
        }
        Err(e @ SyncError::MalformedEdit(_)) => {
            warn!(session = %session_id, "rejected edit: {}", e);
        }
        Err(e @ SyncError::ProtocolViolation(_)) => {
            warn!(session = %session_id, "dropped message: {}", e);
        }
    }
}

/// Create and handle a new WebSocket session
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState) {
    let (outbox, outbound) = Outbox::channel(state.outbox_capacity);
    let session_id = state.engine.lock().connect(outbox);
    let session = WebSocketSession::new(socket, state, session_id, outbound);
    session.handle().await;
}
