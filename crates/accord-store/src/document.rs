//! Stored document representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single stored document: an ID, a monotonically increasing revision,
/// and a JSON body.
///
/// Revisions start at 1 on insert and increase by one on every successful
/// write. They are what conditional updates compare against, so two writers
/// racing on the same document cannot silently overwrite each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID, unique within its collection.
    pub id: String,
    /// Revision of this document. Starts at 1, bumped on every write.
    pub revision: u64,
    /// The document body.
    pub body: Value,
}

impl Document {
    /// Creates a first-revision document.
    #[must_use]
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            revision: 1,
            body,
        }
    }

    /// Returns a copy with the revision bumped and the body replaced.
    #[must_use]
    pub fn with_next_revision(&self, body: Value) -> Self {
        Self {
            id: self.id.clone(),
            revision: self.revision + 1,
            body,
        }
    }

    /// Deserializes the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the body does not match `T`.
    pub fn body_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}

/// Pagination window for listing documents.
///
/// `offset` skips documents from the start of the collection's ID order;
/// `limit` caps how many are returned. The default window returns
/// everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Number of documents to skip.
    pub offset: usize,
    /// Maximum number of documents to return, unbounded when `None`.
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Creates a window covering `limit` documents starting at `offset`.
    #[must_use]
    pub const fn window(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_document_starts_at_revision_one() {
        let doc = Document::new("a", json!({"x": 1}));
        assert_eq!(doc.revision, 1);
        assert_eq!(doc.id, "a");
    }

    #[test]
    fn test_with_next_revision_bumps_and_replaces_body() {
        let doc = Document::new("a", json!({"x": 1}));
        let next = doc.with_next_revision(json!({"x": 2}));
        assert_eq!(next.revision, 2);
        assert_eq!(next.body, json!({"x": 2}));
        assert_eq!(next.id, "a");
    }

    #[test]
    fn test_body_as_typed() {
        #[derive(serde::Deserialize)]
        struct Point {
            x: i64,
        }
        let doc = Document::new("a", json!({"x": 7}));
        let point: Point = doc.body_as().expect("deserializes");
        assert_eq!(point.x, 7);
    }

    #[test]
    fn test_list_options_default_is_unbounded() {
        let options = ListOptions::default();
        assert_eq!(options.offset, 0);
        assert!(options.limit.is_none());
    }
}
