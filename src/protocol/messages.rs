//! Client and server message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::delta::Delta;
use crate::error::{DeltaError, SyncError};
use crate::sync::types::{Identity, Peer, Selection, SessionId};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Request an identity and the current document.
    Login,
    /// An edit to compose onto the shared document.
    Change(Delta),
    /// The sender's selection moved, or was cleared (`None`).
    UserCursorChanged(Option<Selection>),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Payload of `USER_CURSOR_CHANGED`. Clients also send their own `userId`,
/// which is ignored in favour of the connection's identity.
#[derive(Deserialize)]
struct CursorPayload {
    #[serde(default)]
    selection: Option<Selection>,
}

impl ClientMessage {
    /// Decodes one text frame.
    ///
    /// Unrecognised frames are protocol violations; a `CHANGE` whose payload
    /// is not a valid delta is a malformed edit.
    pub fn decode(text: &str) -> Result<Self, SyncError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|error| SyncError::ProtocolViolation(format!("unreadable frame: {error}")))?;

        match envelope.kind.as_str() {
            "LOGIN" => Ok(ClientMessage::Login),
            "CHANGE" => serde_json::from_value(envelope.data)
                .map(ClientMessage::Change)
                .map_err(|error| SyncError::MalformedEdit(DeltaError::Decode(error.to_string()))),
            "USER_CURSOR_CHANGED" => serde_json::from_value::<CursorPayload>(envelope.data)
                .map(|payload| ClientMessage::UserCursorChanged(payload.selection))
                .map_err(|error| {
                    SyncError::ProtocolViolation(format!("invalid cursor payload: {error}"))
                }),
            other => Err(SyncError::ProtocolViolation(format!(
                "unknown message type {other:?}"
            ))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Login => "LOGIN",
            ClientMessage::Change(_) => "CHANGE",
            ClientMessage::UserCursorChanged(_) => "USER_CURSOR_CHANGED",
        }
    }
}

/// Messages the server sends, either as a reply or as a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// The identity assigned to the receiving connection.
    Authenticated(Identity),
    /// Everyone else currently logged in, with their selections.
    UserList(Vec<Peer>),
    /// The current document content.
    Init(Delta),
    UserJoined(Identity),
    UserLeaved {
        id: SessionId,
    },
    /// An edit accepted from another participant.
    Change(Delta),
    UserCursorChanged {
        #[serde(rename = "userId")]
        user_id: SessionId,
        selection: Option<Selection>,
    },
    /// Sent only when rejected edits are reported back to their sender.
    Error {
        code: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Authenticated(_) => "AUTHENTICATED",
            ServerMessage::UserList(_) => "USER_LIST",
            ServerMessage::Init(_) => "INIT",
            ServerMessage::UserJoined(_) => "USER_JOINED",
            ServerMessage::UserLeaved { .. } => "USER_LEAVED",
            ServerMessage::Change(_) => "CHANGE",
            ServerMessage::UserCursorChanged { .. } => "USER_CURSOR_CHANGED",
            ServerMessage::Error { .. } => "ERROR",
        }
    }
}
