//! Outbound message delivery.
//!
//! Every connection owns a bounded queue drained by its own socket task. The
//! engine only ever enqueues with `try_send`, so a slow or dead peer fills
//! its own queue and loses messages instead of stalling everyone else.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::error::DeliveryError;
use crate::protocol::ServerMessage;
use crate::sync::types::SessionId;

/// Sending half of a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::Sender<ServerMessage>,
}

impl Outbox {
    /// Creates an outbox holding at most `capacity` undelivered messages.
    pub fn channel(capacity: usize) -> (Outbox, mpsc::Receiver<ServerMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Outbox { sender }, receiver)
    }

    /// Queues a message without waiting.
    pub fn deliver(&self, message: ServerMessage) -> Result<(), DeliveryError> {
        self.sender.try_send(message).map_err(|error| match error {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Sends one message to a single session, logging a failed delivery.
pub fn send_to(id: SessionId, outbox: &Outbox, message: ServerMessage) -> bool {
    let kind = message.kind();
    match outbox.deliver(message) {
        Ok(()) => true,
        Err(error) => {
            warn!(session = %id, kind, %error, "dropped outbound message");
            false
        }
    }
}

/// Delivers `message` to every recipient, carrying on past failures.
///
/// Returns how many recipients had the message queued.
pub fn broadcast<'a>(
    recipients: impl IntoIterator<Item = (SessionId, &'a Outbox)>,
    message: &ServerMessage,
) -> usize {
    recipients
        .into_iter()
        .filter(|(id, outbox)| send_to(*id, outbox, message.clone()))
        .count()
}
