//! # delta-sync - real-time collaborative editing server
//!
//! Several participants edit one shared rich-text document over WebSockets
//! and see each other's edits and selection cursors live.
//!
//! ## Architecture
//!
//! - **Delta algebra** ([`delta`]): Quill-compatible insert / retain / delete
//!   operations with `compose`
//! - **Synchronization engine** ([`sync`]): the canonical document, the
//!   registry of participants and outbound fanout, all mutated under a single
//!   lock so every participant observes edits in the same order
//! - **Protocol** ([`protocol`]): typed `{type, data}` JSON messages
//! - **Server** ([`server`]): Axum routes and per-connection WebSocket tasks
//!
//! Edits are applied in the order the server receives them. There is no
//! revision check or operational transform: two clients editing from the same
//! stale base are composed blindly.
//!
//! ## Example
//!
//! ```rust
//! use delta_sync::{ClientMessage, Delta, Document, Outbox, Profile, SyncEngine};
//!
//! let mut engine = SyncEngine::new(Document::seed("Hello world"), || {
//!     Profile::new("Ada Lovelace", "#ff8800")
//! });
//! let (outbox, _inbox) = Outbox::channel(16);
//! let id = engine.connect(outbox);
//! engine.handle(id, ClientMessage::Login).unwrap();
//! engine
//!     .handle(id, ClientMessage::Change(Delta::new().retain(11).insert("!")))
//!     .unwrap();
//! assert_eq!(engine.document().content().to_text(), "Hello world!");
//! ```

pub mod config;
pub mod delta;
pub mod error;
pub mod protocol;
pub mod server;
pub mod sync;

// Re-export the main public API
pub use config::Config;
pub use delta::{Delta, Op};
pub use error::{DeliveryError, DeltaError, SeedError, SyncError};
pub use protocol::{ClientMessage, ServerMessage};
pub use sync::{
    Document, EngineOptions, Identity, IdentityProvider, Outbox, Profile, RandomIdentities,
    Selection, SessionId, SharedEngine, SyncEngine,
};
