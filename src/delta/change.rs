//! The [`Delta`] type: builders, canonical `push`, and `compose`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::delta::attributes::{self, AttributeMap};
use crate::delta::iter::{OpIter, UNBOUNDED};
use crate::delta::op::{Insert, Op, OpKind};
use crate::error::DeltaError;

/// An ordered list of operations describing a document or a change to one.
///
/// Deltas built through [`Delta::push`] (and the builder methods, which use
/// it) are kept canonical: adjacent operations of the same kind with equal
/// attributes are merged, and inserts are ordered before deletes at the same
/// position. Two canonical deltas with the same effect compare equal.
///
/// Serializes as `{"ops": [...]}`; deserializes from that or from a bare
/// operation array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Delta {
    ops: Vec<Op>,
}

impl Delta {
    pub fn new() -> Self {
        Delta { ops: Vec::new() }
    }

    /// Wraps operations as-is, without canonicalizing them.
    pub fn from_ops(ops: Vec<Op>) -> Self {
        Delta { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn insert(self, text: impl Into<String>) -> Self {
        self.insert_with(text, None)
    }

    pub fn insert_with(mut self, text: impl Into<String>, attributes: Option<AttributeMap>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.push(Op::Insert {
                insert: Insert::Text(text),
                attributes: attributes.filter(|attributes| !attributes.is_empty()),
            });
        }
        self
    }

    pub fn insert_embed(mut self, embed: Map<String, Value>, attributes: Option<AttributeMap>) -> Self {
        self.push(Op::Insert {
            insert: Insert::Embed(embed),
            attributes: attributes.filter(|attributes| !attributes.is_empty()),
        });
        self
    }

    pub fn retain(self, length: usize) -> Self {
        self.retain_with(length, None)
    }

    pub fn retain_with(mut self, length: usize, attributes: Option<AttributeMap>) -> Self {
        if length > 0 {
            self.push(Op::Retain {
                length,
                attributes: attributes.filter(|attributes| !attributes.is_empty()),
            });
        }
        self
    }

    pub fn delete(mut self, length: usize) -> Self {
        if length > 0 {
            self.push(Op::Delete(length));
        }
        self
    }

    /// Appends an operation, merging it into the tail when possible.
    pub fn push(&mut self, new_op: Op) -> &mut Self {
        if new_op.length() == 0 {
            return self;
        }
        let mut index = self.ops.len();

        if let (Some(Op::Delete(total)), Op::Delete(extra)) = (self.ops.last_mut(), &new_op) {
            *total = total.saturating_add(*extra);
            return self;
        }

        // An insert right after a delete goes in front of it.
        if matches!(self.ops.last(), Some(Op::Delete(_))) && new_op.is_insert() {
            index -= 1;
            if index == 0 {
                self.ops.insert(0, new_op);
                return self;
            }
        }

        if index > 0 {
            let previous = &mut self.ops[index - 1];
            if previous.attributes() == new_op.attributes() {
                match (previous, &new_op) {
                    (
                        Op::Insert {
                            insert: Insert::Text(text),
                            ..
                        },
                        Op::Insert {
                            insert: Insert::Text(more),
                            ..
                        },
                    ) => {
                        text.push_str(more);
                        return self;
                    }
                    (Op::Retain { length, .. }, Op::Retain { length: more, .. }) => {
                        *length = length.saturating_add(*more);
                        return self;
                    }
                    _ => {}
                }
            }
        }

        self.ops.insert(index, new_op);
        self
    }

    /// Drops a trailing retain that carries no attributes; it has no effect.
    pub fn chop(mut self) -> Self {
        if let Some(Op::Retain {
            attributes: None, ..
        }) = self.ops.last()
        {
            self.ops.pop();
        }
        self
    }

    /// Total length of all operations.
    pub fn length(&self) -> usize {
        self.ops
            .iter()
            .fold(0usize, |total, op| total.saturating_add(op.length()))
    }

    /// Length of the document this delta expects to be applied to, up to its
    /// last retain or delete.
    pub fn base_length(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| !op.is_insert())
            .fold(0usize, |total, op| total.saturating_add(op.length()))
    }

    /// How much applying this delta grows (or shrinks) a document.
    pub fn change_length(&self) -> isize {
        self.ops.iter().fold(0isize, |total, op| match op.kind() {
            OpKind::Insert => total.saturating_add_unsigned(op.length()),
            OpKind::Delete => total.saturating_sub_unsigned(op.length()),
            OpKind::Retain => total,
        })
    }

    /// True when the delta consists solely of inserts.
    pub fn is_document(&self) -> bool {
        self.ops.iter().all(Op::is_insert)
    }

    /// Plain text of the inserted content. Embeds are skipped.
    pub fn to_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Insert {
                    insert: Insert::Text(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Rejects zero-length operations, which only hand-built deltas can carry.
    pub fn validate(&self) -> Result<(), DeltaError> {
        for op in &self.ops {
            if op.length() == 0 {
                return Err(match op.kind() {
                    OpKind::Insert => DeltaError::InvalidInsert,
                    OpKind::Retain => DeltaError::InvalidLength { kind: "retain" },
                    OpKind::Delete => DeltaError::InvalidLength { kind: "delete" },
                });
            }
        }
        Ok(())
    }

    /// Returns the delta equivalent to applying `self` and then `other`.
    pub fn compose(&self, other: &Delta) -> Delta {
        let mut this_iter = OpIter::new(&self.ops);
        let mut other_iter = OpIter::new(&other.ops);
        let mut delta = Delta::new();

        // Fast path: a leading plain retain keeps our leading inserts intact.
        if let Some(Op::Retain {
            length: first_retain,
            attributes: None,
        }) = other_iter.peek()
        {
            let mut first_left = *first_retain;
            while this_iter.peek_kind() == OpKind::Insert && this_iter.peek_length() <= first_left {
                first_left -= this_iter.peek_length();
                delta.push(this_iter.take_op(UNBOUNDED));
            }
            if first_retain - first_left > 0 {
                other_iter.take_op(first_retain - first_left);
            }
        }

        while this_iter.has_next() || other_iter.has_next() {
            if other_iter.peek_kind() == OpKind::Insert {
                delta.push(other_iter.take_op(UNBOUNDED));
                continue;
            }
            if this_iter.peek_kind() == OpKind::Delete {
                delta.push(this_iter.take_op(UNBOUNDED));
                continue;
            }

            let length = this_iter.peek_length().min(other_iter.peek_length());
            let this_op = this_iter.take_op(length);
            let other_op = other_iter.take_op(length);

            match other_op {
                Op::Retain {
                    attributes: other_attributes,
                    ..
                } => {
                    let new_op = match this_op {
                        Op::Retain { attributes, .. } => Op::Retain {
                            length,
                            attributes: attributes::compose(
                                attributes.as_ref(),
                                other_attributes.as_ref(),
                                true,
                            ),
                        },
                        Op::Insert { insert, attributes } => Op::Insert {
                            insert,
                            attributes: attributes::compose(
                                attributes.as_ref(),
                                other_attributes.as_ref(),
                                false,
                            ),
                        },
                        Op::Delete(_) => continue,
                    };
                    delta.push(new_op);
                }
                // Deleting retained text keeps the delete; deleting our own
                // insert cancels both.
                Op::Delete(_) => {
                    if this_op.kind() == OpKind::Retain {
                        delta.push(other_op);
                    }
                }
                Op::Insert { .. } => {}
            }
        }

        delta.chop()
    }

    /// Composes `edit` onto this document, checking that the result is still
    /// a document.
    pub fn try_compose_document(&self, edit: &Delta) -> Result<Delta, DeltaError> {
        if !self.is_document() {
            return Err(DeltaError::NotADocument);
        }
        edit.validate()?;

        let length = self.length();
        let span = edit.base_length();
        if span > length {
            return Err(DeltaError::ExceedsDocument { span, length });
        }
        if let Some(index) = self.split_surrogate_pair(edit) {
            return Err(DeltaError::SplitsSurrogatePair { index });
        }

        let composed = self.compose(edit);
        if !composed.is_document() {
            return Err(DeltaError::NotADocument);
        }
        Ok(composed)
    }

    /// First position where `edit` starts or ends a retain or delete in the
    /// middle of one of this document's characters.
    fn split_surrogate_pair(&self, edit: &Delta) -> Option<usize> {
        let mut boundaries = edit
            .ops
            .iter()
            .filter(|op| !op.is_insert())
            .scan(0usize, |position, op| {
                *position = position.saturating_add(op.length());
                Some(*position)
            });
        let mut next = boundaries.next()?;

        let mut position = 0usize;
        for op in &self.ops {
            let Op::Insert {
                insert: Insert::Text(text),
                ..
            } = op
            else {
                position += op.length();
                continue;
            };
            for width in text.chars().map(char::len_utf16) {
                while next <= position {
                    next = boundaries.next()?;
                }
                if next < position + width {
                    return Some(next);
                }
                position += width;
            }
        }
        None
    }
}

impl From<Vec<Op>> for Delta {
    fn from(ops: Vec<Op>) -> Self {
        Delta::from_ops(ops)
    }
}

impl<'de> Deserialize<'de> for Delta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ops = match Value::deserialize(deserializer)? {
            ops @ Value::Array(_) => ops,
            Value::Object(mut wrapper) => wrapper
                .remove("ops")
                .ok_or_else(|| D::Error::custom("missing field `ops`"))?,
            _ => return Err(D::Error::custom("expected an operation list or {\"ops\": [...]}")),
        };
        let ops: Vec<Op> = serde_json::from_value(ops).map_err(D::Error::custom)?;
        Ok(Delta { ops })
    }
}
