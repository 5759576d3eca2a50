//! Wire protocol spoken over the editor WebSocket.
//!
//! Every frame is a JSON object `{"type": ..., "data": ...}`. Inbound frames
//! decode into [`ClientMessage`], outbound ones are built as
//! [`ServerMessage`].

pub mod messages;

pub use messages::{ClientMessage, ServerMessage};
