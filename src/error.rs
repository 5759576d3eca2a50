//! Error types for the synchronization server.
//!
//! None of the runtime errors here are fatal to the process: protocol
//! violations, malformed edits and stale session handles are logged and the
//! offending message is dropped. Only [`SeedError`] stops the server, since a
//! shared document that cannot be seeded leaves nothing to collaborate on.

use thiserror::Error;

use crate::sync::types::SessionId;

/// Structural and semantic errors raised by the delta algebra.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    #[error("operation has no insert, retain or delete")]
    MissingAction,

    #[error("operation carries more than one of insert, retain and delete")]
    ConflictingActions,

    #[error("insert must be a non-empty string or an embed object")]
    InvalidInsert,

    #[error("{kind} length must be a positive integer")]
    InvalidLength { kind: &'static str },

    #[error("delete operations cannot carry attributes")]
    AttributedDelete,

    #[error("edit spans {span} units but the document is only {length} long")]
    ExceedsDocument { span: usize, length: usize },

    #[error("edit boundary at {index} falls inside a surrogate pair")]
    SplitsSurrogatePair { index: usize },

    #[error("content contains retain or delete operations")]
    NotADocument,

    #[error("invalid delta: {0}")]
    Decode(String),
}

/// Errors raised while processing a client message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A message arrived in a state that does not accept it, or could not be
    /// recognised at all.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// An edit failed validation or could not be composed onto the document.
    #[error("malformed edit: {0}")]
    MalformedEdit(#[from] DeltaError),

    /// The handle no longer refers to a live connection.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
}

/// Why a message could not be queued for one destination.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbox is full")]
    Full,

    #[error("connection is closed")]
    Closed,
}

/// Failure to build the initial shared document.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file is not a valid delta: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Delta(#[from] DeltaError),
}
