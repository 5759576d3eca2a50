//! Type definitions shared by the synchronization engine.
//!
//! This module contains the participant-facing value types, organized into
//! focused submodules.

pub mod identity;
pub mod selection;
pub mod session_id;

pub use identity::{Identity, Peer, Profile};
pub use selection::Selection;
pub use session_id::SessionId;
