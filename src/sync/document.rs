//! The single shared document and its edit history.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::delta::Delta;
use crate::error::{DeltaError, SeedError};

/// Canonical document content plus every edit accepted so far.
///
/// `content` always equals the seed composed, in order, with each entry of
/// `history`. It is only ever replaced by `content.compose(edit)` for an
/// edit that passed validation.
#[derive(Debug, Clone)]
pub struct Document {
    content: Delta,
    history: Vec<Delta>,
}

impl Document {
    /// Seeds the document with plain text.
    pub fn seed(initial_text: &str) -> Self {
        Document {
            content: Delta::new().insert(initial_text),
            history: Vec::new(),
        }
    }

    /// Seeds the document with rich content. Fails unless `content` is made
    /// of inserts only.
    pub fn from_content(content: Delta) -> Result<Self, DeltaError> {
        if !content.is_document() {
            return Err(DeltaError::NotADocument);
        }
        content.validate()?;
        Ok(Document {
            content,
            history: Vec::new(),
        })
    }

    /// Seeds the document from a file: a JSON delta when the extension is
    /// `.json`, plain text otherwise.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if is_json {
            let content: Delta = serde_json::from_str(&raw)?;
            Ok(Self::from_content(content)?)
        } else {
            Ok(Self::seed(&raw))
        }
    }

    /// Composes `edit` onto the content and records it.
    ///
    /// On error the document is left untouched.
    pub fn apply(&mut self, edit: Delta) -> Result<&Delta, DeltaError> {
        let content = self.content.try_compose_document(&edit)?;
        debug!(
            revision = self.history.len() + 1,
            change = edit.change_length(),
            "applied edit"
        );
        self.content = content;
        self.history.push(edit);
        Ok(&self.content)
    }

    /// A copy of the current content, for bootstrapping new participants.
    pub fn snapshot(&self) -> Delta {
        self.content.clone()
    }

    pub fn content(&self) -> &Delta {
        &self.content
    }

    pub fn history(&self) -> &[Delta] {
        &self.history
    }

    /// Number of edits applied since seeding.
    pub fn revision(&self) -> usize {
        self.history.len()
    }

    /// Content length in UTF-16 units.
    pub fn len(&self) -> usize {
        self.content.length()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_seed_and_snapshot() {
        let document = Document::seed("Hello world");
        assert_eq!(document.snapshot().to_text(), "Hello world");
        assert_eq!(document.revision(), 0);
        assert_eq!(document.len(), 11);
        assert!(Document::seed("").is_empty());
    }

    #[test]
    fn test_apply_updates_content_and_history() {
        let mut document = Document::seed("Hello world");
        let edit = Delta::new().retain(11).insert("!");

        let content = document.apply(edit.clone()).unwrap();
        assert_eq!(content.to_text(), "Hello world!");
        assert_eq!(document.history(), &[edit]);
        assert_eq!(document.revision(), 1);
    }

    #[test]
    fn test_content_equals_seed_composed_with_history() {
        let seed = Document::seed("abc");
        let mut document = seed.clone();
        document.apply(Delta::new().insert(">")).unwrap();
        document.apply(Delta::new().retain(2).delete(1)).unwrap();
        document.apply(Delta::new().retain(3).insert("!")).unwrap();

        let replayed = document
            .history()
            .iter()
            .fold(seed.snapshot(), |content, edit| content.compose(edit));
        assert_eq!(&replayed, document.content());
        assert_eq!(document.content().to_text(), ">ac!");
    }

    #[test]
    fn test_failed_apply_leaves_state_unchanged() {
        let mut document = Document::seed("abc");
        let result = document.apply(Delta::new().retain(10).insert("x"));
        assert!(matches!(result, Err(DeltaError::ExceedsDocument { .. })));
        assert_eq!(document.content().to_text(), "abc");
        assert!(document.history().is_empty());
    }

    #[test]
    fn test_from_content_requires_document() {
        assert!(Document::from_content(Delta::new().retain(1)).is_err());
        assert!(Document::from_content(Delta::new().insert("ok")).is_ok());
    }

    #[test]
    fn test_load_seed_files() {
        let dir = std::env::temp_dir().join(format!("delta-sync-seed-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let text_path = dir.join("seed.txt");
        fs::File::create(&text_path)
            .unwrap()
            .write_all(b"plain seed")
            .unwrap();
        assert_eq!(Document::load(&text_path).unwrap().content().to_text(), "plain seed");

        let json_path = dir.join("seed.json");
        fs::write(&json_path, r#"{"ops":[{"insert":"rich","attributes":{"bold":true}}]}"#).unwrap();
        assert_eq!(Document::load(&json_path).unwrap().len(), 4);

        let bad_path = dir.join("bad.json");
        fs::write(&bad_path, r#"{"ops":[{"retain":3}]}"#).unwrap();
        assert!(matches!(Document::load(&bad_path), Err(SeedError::Delta(_))));

        assert!(matches!(Document::load(&dir.join("missing.txt")), Err(SeedError::Io(_))));

        fs::remove_dir_all(&dir).unwrap();
    }
}
