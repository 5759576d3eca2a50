//! Collaborative synchronization core.
//!
//! This module contains the shared document, the registry of logged-in
//! participants, outbound fanout and the engine tying them together.

pub mod document;
pub mod engine;
pub mod fanout;
pub mod identity;
pub mod registry;
pub mod types;

// Re-export the main public API
pub use document::Document;
pub use engine::{ConnectionState, EngineOptions, EngineStats, SharedEngine, SyncEngine};
pub use fanout::Outbox;
pub use identity::{IdentityProvider, RandomIdentities};
pub use registry::{Registry, Session};
pub use types::{Identity, Peer, Profile, Selection, SessionId};
