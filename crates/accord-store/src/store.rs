//! The storage backend trait.
//!
//! [`Store`] is the seam between services and persistence. Methods return
//! boxed futures so the trait stays object-safe and backends can be swapped
//! behind `Arc<dyn Store>` without generics spreading through the call
//! graph.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{Document, ListOptions};
use crate::error::{StoreError, StoreResult};

/// A boxed future returned by [`Store`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// A shared, type-erased storage backend.
pub type SharedStore = Arc<dyn Store>;

/// Revisioned document storage over named collections.
///
/// Collections are explicit: every document operation on a collection that
/// has not been created fails with [`StoreError::UnknownCollection`].
/// Creating and dropping collections is itself a storage operation, which
/// is what lets schema migrations treat collection layout as managed state.
///
/// # Invariants
///
/// - Inserts produce revision 1; every later successful write bumps the
///   revision by exactly one.
/// - [`Store::update_if`] writes only when the stored revision equals the
///   expected one, and fails with [`StoreError::RevisionMismatch`]
///   otherwise.
/// - [`Store::list`] returns documents in ascending ID order.
pub trait Store: Send + Sync + 'static {
    /// Fetches a document by ID, or `None` if it does not exist.
    fn get<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, Option<Document>>;

    /// Inserts a new document with revision 1.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the ID is taken.
    fn insert<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        body: Value,
    ) -> StoreFuture<'a, Document>;

    /// Writes a document unconditionally, creating it if absent.
    ///
    /// Returns the stored document: revision 1 for a fresh ID, or the
    /// previous revision plus one when overwriting.
    fn put<'a>(&'a self, collection: &'a str, id: &'a str, body: Value)
        -> StoreFuture<'a, Document>;

    /// Replaces a document body only if the stored revision matches
    /// `expected_revision`.
    ///
    /// Fails with [`StoreError::RevisionMismatch`] when another writer got
    /// there first, and [`StoreError::NotFound`] when the document is gone.
    fn update_if<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        expected_revision: u64,
        body: Value,
    ) -> StoreFuture<'a, Document>;

    /// Deletes a document. Returns `true` if it existed.
    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, bool>;

    /// Lists documents in ascending ID order within the given window.
    fn list<'a>(&'a self, collection: &'a str, options: ListOptions)
        -> StoreFuture<'a, Vec<Document>>;

    /// Counts the documents in a collection.
    fn count<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, u64>;

    /// Lists collection names in ascending order.
    fn collections(&self) -> StoreFuture<'_, Vec<String>>;

    /// Creates a collection. Returns `true` if it was created and `false`
    /// if it already existed.
    fn create_collection<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, bool>;

    /// Drops a collection and everything in it. Returns `true` if it
    /// existed.
    fn drop_collection<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, bool>;
}

/// Validates a collection name for use across backends.
///
/// Names are restricted to characters that are safe as directory names, so
/// the same contract holds for every backend.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] for empty names or names containing
/// characters outside `[A-Za-z0-9_-]`.
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::InvalidKey {
            value: name.to_string(),
            reason: "collection names must not be empty",
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(StoreError::InvalidKey {
            value: name.to_string(),
            reason: "collection names may only contain letters, digits, `_`, and `-`",
        });
    }
    Ok(())
}

/// Validates a document ID for use across backends.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] for empty IDs, IDs starting with a
/// dot, or IDs containing characters outside `[A-Za-z0-9._-]`.
pub fn validate_document_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidKey {
            value: id.to_string(),
            reason: "document IDs must not be empty",
        });
    }
    if id.starts_with('.') {
        return Err(StoreError::InvalidKey {
            value: id.to_string(),
            reason: "document IDs must not start with a dot",
        });
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(StoreError::InvalidKey {
            value: id.to_string(),
            reason: "document IDs may only contain letters, digits, `_`, `-`, and `.`",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==== Key validation ====

    #[test]
    fn test_valid_collection_names() {
        assert!(validate_collection_name("notes").is_ok());
        assert!(validate_collection_name("__accord").is_ok());
        assert!(validate_collection_name("user-events_2024").is_ok());
    }

    #[test]
    fn test_invalid_collection_names() {
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("a/b").is_err());
        assert!(validate_collection_name("..").is_err());
        assert!(validate_collection_name("with space").is_err());
    }

    #[test]
    fn test_valid_document_ids() {
        assert!(validate_document_id("abc-123").is_ok());
        assert!(validate_document_id("20240101120000_create_notes").is_ok());
        assert!(validate_document_id("v1.2.3").is_ok());
    }

    #[test]
    fn test_invalid_document_ids() {
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id(".hidden").is_err());
        assert!(validate_document_id("a/b").is_err());
        assert!(validate_document_id("a\\b").is_err());
    }
}
