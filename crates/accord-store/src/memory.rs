//! In-memory storage backend.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::document::{Document, ListOptions};
use crate::error::StoreError;
use crate::store::{validate_collection_name, validate_document_id, Store, StoreFuture};

type Collection = BTreeMap<String, Document>;

/// A [`Store`] backed by process memory.
///
/// Collections are `BTreeMap`s, so listing order falls out of the key
/// order for free. This is the backend used by tests and single-process
/// deployments; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    /// Creates an empty store with no collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given collections already present.
    #[must_use]
    pub fn with_collections<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collections = names
            .into_iter()
            .map(|name| (name.into(), Collection::new()))
            .collect();
        Self {
            collections: RwLock::new(collections),
        }
    }

    fn check_keys(collection: &str, id: &str) -> Result<(), StoreError> {
        validate_collection_name(collection)?;
        validate_document_id(id)
    }
}

impl Store for MemoryStore {
    fn get<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            Self::check_keys(collection, id)?;
            let collections = self.collections.read();
            let docs = collections
                .get(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            Ok(docs.get(id).cloned())
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        body: Value,
    ) -> StoreFuture<'a, Document> {
        Box::pin(async move {
            Self::check_keys(collection, id)?;
            let mut collections = self.collections.write();
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            if docs.contains_key(id) {
                return Err(StoreError::AlreadyExists {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
            let doc = Document::new(id, body);
            docs.insert(id.to_string(), doc.clone());
            Ok(doc)
        })
    }

    fn put<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        body: Value,
    ) -> StoreFuture<'a, Document> {
        Box::pin(async move {
            Self::check_keys(collection, id)?;
            let mut collections = self.collections.write();
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            let doc = match docs.get(id) {
                Some(existing) => existing.with_next_revision(body),
                None => Document::new(id, body),
            };
            docs.insert(id.to_string(), doc.clone());
            Ok(doc)
        })
    }

    fn update_if<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        expected_revision: u64,
        body: Value,
    ) -> StoreFuture<'a, Document> {
        Box::pin(async move {
            Self::check_keys(collection, id)?;
            let mut collections = self.collections.write();
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            let existing = docs.get(id).ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
            if existing.revision != expected_revision {
                return Err(StoreError::RevisionMismatch {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    expected: expected_revision,
                    actual: existing.revision,
                });
            }
            let doc = existing.with_next_revision(body);
            docs.insert(id.to_string(), doc.clone());
            Ok(doc)
        })
    }

    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            Self::check_keys(collection, id)?;
            let mut collections = self.collections.write();
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            Ok(docs.remove(id).is_some())
        })
    }

    fn list<'a>(
        &'a self,
        collection: &'a str,
        options: ListOptions,
    ) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            validate_collection_name(collection)?;
            let collections = self.collections.read();
            let docs = collections
                .get(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            let limit = options.limit.unwrap_or(usize::MAX);
            Ok(docs
                .values()
                .skip(options.offset)
                .take(limit)
                .cloned()
                .collect())
        })
    }

    fn count<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            validate_collection_name(collection)?;
            let collections = self.collections.read();
            let docs = collections
                .get(collection)
                .ok_or_else(|| StoreError::UnknownCollection {
                    collection: collection.to_string(),
                })?;
            Ok(docs.len() as u64)
        })
    }

    fn collections(&self) -> StoreFuture<'_, Vec<String>> {
        Box::pin(async move { Ok(self.collections.read().keys().cloned().collect()) })
    }

    fn create_collection<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            validate_collection_name(collection)?;
            let mut collections = self.collections.write();
            if collections.contains_key(collection) {
                return Ok(false);
            }
            collections.insert(collection.to_string(), Collection::new());
            Ok(true)
        })
    }

    fn drop_collection<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            validate_collection_name(collection)?;
            Ok(self.collections.write().remove(collection).is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::with_collections(["notes"])
    }

    // ==== Collection management ====

    #[tokio::test]
    async fn test_operations_on_unknown_collection_fail() {
        let store = MemoryStore::new();
        let err = store.get("missing", "a").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection { .. }));
        let err = store.insert("missing", "a", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection { .. }));
    }

    #[tokio::test]
    async fn test_create_collection_reports_whether_created() {
        let store = MemoryStore::new();
        assert!(store.create_collection("notes").await.unwrap());
        assert!(!store.create_collection("notes").await.unwrap());
        assert_eq!(store.collections().await.unwrap(), vec!["notes".to_string()]);
    }

    #[tokio::test]
    async fn test_drop_collection_removes_documents() {
        let store = store();
        store.insert("notes", "a", json!({"x": 1})).await.unwrap();
        assert!(store.drop_collection("notes").await.unwrap());
        assert!(!store.drop_collection("notes").await.unwrap());
        assert!(store.get("notes", "a").await.is_err());
    }

    // ==== Document lifecycle ====

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = store();
        let doc = store.insert("notes", "a", json!({"title": "first"})).await.unwrap();
        assert_eq!(doc.revision, 1);

        let fetched = store.get("notes", "a").await.unwrap().expect("present");
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn test_insert_duplicate_fails() {
        let store = store();
        store.insert("notes", "a", json!({})).await.unwrap();
        let err = store.insert("notes", "a", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_put_bumps_revision_on_overwrite() {
        let store = store();
        store.insert("notes", "a", json!({"v": 1})).await.unwrap();
        let updated = store.put("notes", "a", json!({"v": 2})).await.unwrap();
        assert_eq!(updated.revision, 2);
        assert_eq!(updated.body, json!({"v": 2}));

        let fresh = store.put("notes", "b", json!({"v": 1})).await.unwrap();
        assert_eq!(fresh.revision, 1);
    }

    #[tokio::test]
    async fn test_update_if_checks_revision() {
        let store = store();
        let doc = store.insert("notes", "a", json!({"v": 1})).await.unwrap();

        let updated = store
            .update_if("notes", "a", doc.revision, json!({"v": 2}))
            .await
            .unwrap();
        assert_eq!(updated.revision, 2);

        let err = store
            .update_if("notes", "a", doc.revision, json!({"v": 3}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::RevisionMismatch { expected: 1, actual: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_update_if_missing_document_fails() {
        let store = store();
        let err = store.update_if("notes", "ghost", 1, json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = store();
        store.insert("notes", "a", json!({})).await.unwrap();
        assert!(store.delete("notes", "a").await.unwrap());
        assert!(!store.delete("notes", "a").await.unwrap());
    }

    // ==== Listing ====

    #[tokio::test]
    async fn test_list_returns_id_order() {
        let store = store();
        store.insert("notes", "c", json!({})).await.unwrap();
        store.insert("notes", "a", json!({})).await.unwrap();
        store.insert("notes", "b", json!({})).await.unwrap();

        let docs = store.list("notes", ListOptions::default()).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_list_window() {
        let store = store();
        for id in ["a", "b", "c", "d"] {
            store.insert("notes", id, json!({})).await.unwrap();
        }
        let docs = store.list("notes", ListOptions::window(1, 2)).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(store.count("notes").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let store = store();
        let err = store.insert("notes", "../escape", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }
}
