//! Document storage for Accord services.
//!
//! This crate provides the storage seam the rest of the platform builds
//! on: revisioned JSON documents in named collections, behind the
//! object-safe [`Store`] trait. Two backends ship here, an in-memory store
//! for tests and single-process use and a filesystem store with atomic
//! writes. Access is scoped through [`StorePool`] handles, and exclusive
//! maintenance work coordinates through the advisory [`StoreLock`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use accord_store::{ListOptions, MemoryStore, StorePool};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), accord_store::StoreError> {
//! let store = Arc::new(MemoryStore::with_collections(["notes"]));
//! let pool = StorePool::new(store, 8);
//!
//! let handle = pool.acquire().await?;
//! handle.insert("notes", "a", json!({"title": "first"})).await?;
//! let docs = handle.list("notes", ListOptions::default()).await?;
//! assert_eq!(docs.len(), 1);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/accord-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod document;
mod error;
mod file;
mod lock;
mod memory;
mod pool;
mod store;

pub use document::{Document, ListOptions};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use lock::{LockInfo, StoreLock, LOCK_DOCUMENT, SYSTEM_COLLECTION};
pub use memory::MemoryStore;
pub use pool::{StoreHandle, StorePool};
pub use store::{
    validate_collection_name, validate_document_id, SharedStore, Store, StoreFuture,
};
