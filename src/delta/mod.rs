//! Rich-text delta algebra.
//!
//! A [`Delta`] is an ordered list of insert / retain / delete operations, the
//! same model the Quill editor uses on the client. A delta made only of
//! inserts is a document; any other delta is an edit that can be composed
//! onto a document to produce the next one.

pub mod attributes;
pub mod change;
pub mod iter;
pub mod op;
pub mod text;

// Re-export the main public API
pub use attributes::AttributeMap;
pub use change::Delta;
pub use iter::{OpIter, UNBOUNDED};
pub use op::{Insert, Op, OpKind};
