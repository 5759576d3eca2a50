//! Single delta operations and their wire representation.
//!
//! On the wire an operation is a JSON object carrying exactly one of
//! `insert`, `retain` or `delete`, plus optional `attributes`:
//!
//! ```json
//! {"insert": "Hello", "attributes": {"bold": true}}
//! {"retain": 5}
//! {"delete": 3}
//! ```
//!
//! Deserialization goes through [`RawOp`] so that structurally invalid
//! operations are rejected at the boundary instead of reaching `compose`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::delta::attributes::AttributeMap;
use crate::delta::text::utf16_len;
use crate::error::DeltaError;

/// The content of an insert: either text or a single embedded object
/// (image, formula, ...). An embed always has length 1.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    Text(String),
    Embed(Map<String, Value>),
}

/// Discriminant of an [`Op`], used by the compose loop to peek ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Insert,
    Retain,
    Delete,
}

/// A single insert, retain or delete step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOp", into = "RawOp")]
pub enum Op {
    Insert {
        insert: Insert,
        attributes: Option<AttributeMap>,
    },
    Retain {
        length: usize,
        attributes: Option<AttributeMap>,
    },
    Delete(usize),
}

impl Op {
    /// Creates a plain text insert.
    pub fn insert(text: impl Into<String>) -> Self {
        Op::Insert {
            insert: Insert::Text(text.into()),
            attributes: None,
        }
    }

    /// Creates an attribute-less retain.
    pub fn retain(length: usize) -> Self {
        Op::Retain {
            length,
            attributes: None,
        }
    }

    /// Creates a delete.
    pub fn delete(length: usize) -> Self {
        Op::Delete(length)
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Op::Insert { .. } => OpKind::Insert,
            Op::Retain { .. } => OpKind::Retain,
            Op::Delete(_) => OpKind::Delete,
        }
    }

    /// Length of the operation in UTF-16 code units.
    pub fn length(&self) -> usize {
        match self {
            Op::Insert {
                insert: Insert::Text(text),
                ..
            } => utf16_len(text),
            Op::Insert {
                insert: Insert::Embed(_),
                ..
            } => 1,
            Op::Retain { length, .. } => *length,
            Op::Delete(length) => *length,
        }
    }

    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => attributes.as_ref(),
            Op::Delete(_) => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        self.kind() == OpKind::Insert
    }
}

/// Loosely typed mirror of the wire format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    insert: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retain: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delete: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributeMap>,
}

fn positive_length(value: &Value, kind: &'static str) -> Result<usize, DeltaError> {
    value
        .as_u64()
        .filter(|length| *length > 0)
        .and_then(|length| usize::try_from(length).ok())
        .ok_or(DeltaError::InvalidLength { kind })
}

impl TryFrom<RawOp> for Op {
    type Error = DeltaError;

    fn try_from(raw: RawOp) -> Result<Self, Self::Error> {
        let actions = [raw.insert.is_some(), raw.retain.is_some(), raw.delete.is_some()]
            .into_iter()
            .filter(|present| *present)
            .count();
        match actions {
            0 => return Err(DeltaError::MissingAction),
            1 => {}
            _ => return Err(DeltaError::ConflictingActions),
        }

        let attributes = raw.attributes.filter(|attributes| !attributes.is_empty());

        if let Some(value) = raw.insert {
            let insert = match value {
                Value::String(text) if !text.is_empty() => Insert::Text(text),
                Value::Object(embed) if !embed.is_empty() => Insert::Embed(embed),
                _ => return Err(DeltaError::InvalidInsert),
            };
            return Ok(Op::Insert { insert, attributes });
        }

        if let Some(value) = raw.retain {
            let length = positive_length(&value, "retain")?;
            return Ok(Op::Retain { length, attributes });
        }

        let value = raw.delete.unwrap_or_default();
        let length = positive_length(&value, "delete")?;
        if attributes.is_some() {
            return Err(DeltaError::AttributedDelete);
        }
        Ok(Op::Delete(length))
    }
}

impl From<Op> for RawOp {
    fn from(op: Op) -> Self {
        match op {
            Op::Insert { insert, attributes } => RawOp {
                insert: Some(match insert {
                    Insert::Text(text) => Value::String(text),
                    Insert::Embed(embed) => Value::Object(embed),
                }),
                attributes,
                ..RawOp::default()
            },
            Op::Retain { length, attributes } => RawOp {
                retain: Some(Value::from(length as u64)),
                attributes,
                ..RawOp::default()
            },
            Op::Delete(length) => RawOp {
                delete: Some(Value::from(length as u64)),
                ..RawOp::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Op, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_parse_valid_ops() {
        assert_eq!(parse(json!({"insert": "abc"})).unwrap(), Op::insert("abc"));
        assert_eq!(parse(json!({"retain": 4})).unwrap(), Op::retain(4));
        assert_eq!(parse(json!({"delete": 2})).unwrap(), Op::delete(2));

        let bold = parse(json!({"insert": "x", "attributes": {"bold": true}})).unwrap();
        assert_eq!(bold.attributes().unwrap()["bold"], json!(true));

        let image = parse(json!({"insert": {"image": "cat.png"}})).unwrap();
        assert_eq!(image.length(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_ops() {
        assert!(parse(json!({})).is_err());
        assert!(parse(json!({"insert": "a", "delete": 1})).is_err());
        assert!(parse(json!({"insert": ""})).is_err());
        assert!(parse(json!({"insert": 42})).is_err());
        assert!(parse(json!({"retain": 0})).is_err());
        assert!(parse(json!({"retain": -3})).is_err());
        assert!(parse(json!({"retain": 1.5})).is_err());
        assert!(parse(json!({"delete": "2"})).is_err());
        assert!(parse(json!({"delete": 1, "attributes": {"bold": true}})).is_err());
        assert!(parse(json!("insert")).is_err());
    }

    #[test]
    fn test_empty_attributes_are_dropped() {
        let op = parse(json!({"retain": 3, "attributes": {}})).unwrap();
        assert_eq!(op, Op::retain(3));
    }

    #[test]
    fn test_serialize_wire_shape() {
        assert_eq!(serde_json::to_value(Op::insert("hi")).unwrap(), json!({"insert": "hi"}));
        assert_eq!(serde_json::to_value(Op::delete(7)).unwrap(), json!({"delete": 7}));
    }

    #[test]
    fn test_length_in_utf16_units() {
        assert_eq!(Op::insert("🦀!").length(), 3);
        assert_eq!(Op::retain(9).length(), 9);
    }
}
