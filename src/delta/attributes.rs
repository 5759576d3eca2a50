//! Formatting attribute maps attached to inserts and retains.

use serde_json::{Map, Value};

/// Formatting attributes, e.g. `{"bold": true, "color": "#ff0000"}`.
///
/// A `null` value on a retain removes that format from the retained text.
pub type AttributeMap = Map<String, Value>;

/// Composes attribute map `b` on top of `a`.
///
/// Keys set in `b` win. When `keep_null` is false (composing onto an insert)
/// `null` entries are dropped since there is nothing left to unset. Returns
/// `None` when the result is empty.
pub fn compose(
    a: Option<&AttributeMap>,
    b: Option<&AttributeMap>,
    keep_null: bool,
) -> Option<AttributeMap> {
    let mut attributes = b.cloned().unwrap_or_default();
    if !keep_null {
        attributes.retain(|_, value| !value.is_null());
    }
    if let Some(a) = a {
        for (key, value) in a {
            if !b.is_some_and(|b| b.contains_key(key)) {
                attributes.insert(key.clone(), value.clone());
            }
        }
    }
    (!attributes.is_empty()).then_some(attributes)
}
