//! Text selection owned by a participant.

use serde::{Deserialize, Serialize};

/// A selected range in the document, in UTF-16 units. A zero `length` is a
/// plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Selection { index, length }
    }
}
