//! Filesystem storage backend.
//!
//! Layout: one directory per collection under the store root, one
//! `<id>.json` file per document. Writes go through a temp file in the
//! target directory and are renamed into place, so a crash mid-write never
//! leaves a half-written document behind.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::document::{Document, ListOptions};
use crate::error::{StoreError, StoreResult};
use crate::store::{validate_collection_name, validate_document_id, Store, StoreFuture};

/// A [`Store`] persisted to a directory tree.
///
/// Mutations are serialized per process through an internal lock. Writers
/// in other processes are not coordinated here; they go through the
/// advisory [`StoreLock`](crate::StoreLock) instead.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    guard: RwLock<()>,
}

impl FileStore {
    /// Opens a file store rooted at `root`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the root cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            guard: RwLock::new(()),
        })
    }

    /// Returns the root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> StoreResult<PathBuf> {
        validate_collection_name(collection)?;
        let dir = self.root.join(collection);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(StoreError::UnknownCollection {
                collection: collection.to_string(),
            })
        }
    }

    fn document_path(dir: &Path, id: &str) -> StoreResult<PathBuf> {
        validate_document_id(id)?;
        Ok(dir.join(format!("{id}.json")))
    }

    fn read_document(path: &Path) -> StoreResult<Option<Document>> {
        match fs::read(path) {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_document(dir: &Path, path: &Path, doc: &Document, exclusive: bool) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        let mut raw = serde_json::to_vec_pretty(doc)?;
        raw.push(b'\n');
        tmp.write_all(&raw)?;
        if exclusive {
            tmp.persist_noclobber(path).map_err(|err| {
                if err.error.kind() == std::io::ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists {
                        collection: dir
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        id: doc.id.clone(),
                    }
                } else {
                    StoreError::Io(err.error)
                }
            })?;
        } else {
            tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
        }
        Ok(())
    }

    fn load_all(dir: &Path) -> StoreResult<Vec<Document>> {
        let mut docs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(doc) = Self::read_document(&path)? {
                docs.push(doc);
            }
        }
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}

impl Store for FileStore {
    fn get<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            let _read = self.guard.read();
            let dir = self.collection_dir(collection)?;
            let path = Self::document_path(&dir, id)?;
            Self::read_document(&path)
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        body: Value,
    ) -> StoreFuture<'a, Document> {
        Box::pin(async move {
            let _write = self.guard.write();
            let dir = self.collection_dir(collection)?;
            let path = Self::document_path(&dir, id)?;
            let doc = Document::new(id, body);
            Self::write_document(&dir, &path, &doc, true)?;
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
            let _write = self.guard.write();
            let dir = self.collection_dir(collection)?;
            let path = Self::document_path(&dir, id)?;
            let doc = match Self::read_document(&path)? {
                Some(existing) => existing.with_next_revision(body),
                None => Document::new(id, body),
            };
            Self::write_document(&dir, &path, &doc, false)?;
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
            let _write = self.guard.write();
            let dir = self.collection_dir(collection)?;
            let path = Self::document_path(&dir, id)?;
            let existing =
                Self::read_document(&path)?.ok_or_else(|| StoreError::NotFound {
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
            Self::write_document(&dir, &path, &doc, false)?;
            Ok(doc)
        })
    }

    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let _write = self.guard.write();
            let dir = self.collection_dir(collection)?;
            let path = Self::document_path(&dir, id)?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(true),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn list<'a>(
        &'a self,
        collection: &'a str,
        options: ListOptions,
    ) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            let _read = self.guard.read();
            let dir = self.collection_dir(collection)?;
            let docs = Self::load_all(&dir)?;
            let limit = options.limit.unwrap_or(usize::MAX);
            Ok(docs.into_iter().skip(options.offset).take(limit).collect())
        })
    }

    fn count<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            let _read = self.guard.read();
            let dir = self.collection_dir(collection)?;
            Ok(Self::load_all(&dir)?.len() as u64)
        })
    }

    fn collections(&self) -> StoreFuture<'_, Vec<String>> {
        Box::pin(async move {
            let _read = self.guard.read();
            let mut names = Vec::new();
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            names.sort();
            Ok(names)
        })
    }

    fn create_collection<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            validate_collection_name(collection)?;
            let _write = self.guard.write();
            let dir = self.root.join(collection);
            if dir.is_dir() {
                return Ok(false);
            }
            fs::create_dir_all(&dir)?;
            Ok(true)
        })
    }

    fn drop_collection<'a>(&'a self, collection: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            validate_collection_name(collection)?;
            let _write = self.guard.write();
            let dir = self.root.join(collection);
            if !dir.is_dir() {
                return Ok(false);
            }
            fs::remove_dir_all(&dir)?;
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn open_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::open(dir.path().join("data")).expect("open");
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_creates_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("nested").join("data");
        let store = FileStore::open(&root).expect("open");
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_insert_get_round_trip() {
        let (_dir, store) = open_store();
        store.create_collection("notes").await.unwrap();
        let doc = store.insert("notes", "a", json!({"title": "first"})).await.unwrap();

        let fetched = store.get("notes", "a").await.unwrap().expect("present");
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("data");
        {
            let store = FileStore::open(&root).expect("open");
            store.create_collection("notes").await.unwrap();
            store.insert("notes", "a", json!({"v": 1})).await.unwrap();
            store.put("notes", "a", json!({"v": 2})).await.unwrap();
        }

        let reopened = FileStore::open(&root).expect("reopen");
        let doc = reopened.get("notes", "a").await.unwrap().expect("present");
        assert_eq!(doc.revision, 2);
        assert_eq!(doc.body, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_insert_duplicate_fails() {
        let (_dir, store) = open_store();
        store.create_collection("notes").await.unwrap();
        store.insert("notes", "a", json!({})).await.unwrap();
        let err = store.insert("notes", "a", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_update_if_enforces_revision() {
        let (_dir, store) = open_store();
        store.create_collection("notes").await.unwrap();
        store.insert("notes", "a", json!({"v": 1})).await.unwrap();

        let updated = store.update_if("notes", "a", 1, json!({"v": 2})).await.unwrap();
        assert_eq!(updated.revision, 2);

        let err = store.update_if("notes", "a", 1, json!({"v": 3})).await.unwrap_err();
        assert!(matches!(err, StoreError::RevisionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_list_sorted_and_windowed() {
        let (_dir, store) = open_store();
        store.create_collection("notes").await.unwrap();
        for id in ["c", "a", "d", "b"] {
            store.insert("notes", id, json!({})).await.unwrap();
        }

        let all = store.list("notes", ListOptions::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);

        let windowed = store.list("notes", ListOptions::window(2, 1)).await.unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].id, "c");
    }

    #[tokio::test]
    async fn test_drop_collection_removes_directory() {
        let (_dir, store) = open_store();
        store.create_collection("notes").await.unwrap();
        store.insert("notes", "a", json!({})).await.unwrap();

        assert!(store.drop_collection("notes").await.unwrap());
        let err = store.get("notes", "a").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection { .. }));
    }

    #[tokio::test]
    async fn test_collections_lists_directories_sorted() {
        let (_dir, store) = open_store();
        store.create_collection("zebra").await.unwrap();
        store.create_collection("alpha").await.unwrap();
        assert_eq!(
            store.collections().await.unwrap(),
            vec!["alpha".to_string(), "zebra".to_string()]
        );
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let (_dir, store) = open_store();
        store.create_collection("notes").await.unwrap();
        assert!(matches!(
            store.get("notes", "../sneaky").await.unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
        assert!(matches!(
            store.get("..", "a").await.unwrap_err(),
            StoreError::InvalidKey { .. }
        ));
    }
}
