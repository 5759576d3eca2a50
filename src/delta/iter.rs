//! Cursor over a delta's operations that can split them at arbitrary lengths.

use crate::delta::op::{Insert, Op, OpKind};
use crate::delta::text::utf16_slice;

/// Length reported once the iterator is exhausted: an implicit retain of
/// the rest of the document.
pub const UNBOUNDED: usize = usize::MAX;

/// Walks a slice of operations, handing out pieces of at most a requested
/// length. Past the end it yields an unbounded retain.
#[derive(Debug, Clone)]
pub struct OpIter<'a> {
    ops: &'a [Op],
    index: usize,
    offset: usize,
}

impl<'a> OpIter<'a> {
    pub fn new(ops: &'a [Op]) -> Self {
        OpIter {
            ops,
            index: 0,
            offset: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.ops.len()
    }

    /// The operation under the cursor, ignoring any partial offset.
    pub fn peek(&self) -> Option<&'a Op> {
        self.ops.get(self.index)
    }

    /// Remaining length of the current operation.
    pub fn peek_length(&self) -> usize {
        self.peek()
            .map(|op| op.length() - self.offset)
            .unwrap_or(UNBOUNDED)
    }

    pub fn peek_kind(&self) -> OpKind {
        self.peek().map(Op::kind).unwrap_or(OpKind::Retain)
    }

    /// Takes up to `length` units from the current operation.
    ///
    /// Passing [`UNBOUNDED`] takes whatever is left of it.
    pub fn take_op(&mut self, length: usize) -> Op {
        let Some(op) = self.ops.get(self.index) else {
            return Op::retain(UNBOUNDED);
        };

        let offset = self.offset;
        let remaining = op.length() - offset;
        let length = if length >= remaining {
            self.index += 1;
            self.offset = 0;
            remaining
        } else {
            self.offset += length;
            length
        };

        match op {
            Op::Delete(_) => Op::Delete(length),
            Op::Retain { attributes, .. } => Op::Retain {
                length,
                attributes: attributes.clone(),
            },
            Op::Insert {
                insert: Insert::Text(text),
                attributes,
            } => Op::Insert {
                insert: Insert::Text(utf16_slice(text, offset, length).to_owned()),
                attributes: attributes.clone(),
            },
            Op::Insert { insert, attributes } => Op::Insert {
                insert: insert.clone(),
                attributes: attributes.clone(),
            },
        }
    }
}
