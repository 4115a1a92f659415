//! Storage error types.

use accord_core::AccordError;
use thiserror::Error;

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by storage backends and the surrounding pool and lock
/// machinery.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document `{id}` not found in collection `{collection}`")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Document ID that was requested.
        id: String,
    },

    /// An insert targeted an ID that is already taken.
    #[error("document `{id}` already exists in collection `{collection}`")]
    AlreadyExists {
        /// Collection that was written.
        collection: String,
        /// Document ID that collided.
        id: String,
    },

    /// A conditional update observed a different revision than expected.
    #[error(
        "revision mismatch for `{id}` in collection `{collection}`: expected {expected}, found {actual}"
    )]
    RevisionMismatch {
        /// Collection that was written.
        collection: String,
        /// Document ID that was updated.
        id: String,
        /// Revision the caller expected.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// The named collection has not been created.
    #[error("unknown collection `{collection}`")]
    UnknownCollection {
        /// Collection that was addressed.
        collection: String,
    },

    /// A collection or document key contains characters the backends cannot
    /// represent.
    #[error("invalid storage key `{value}`: {reason}")]
    InvalidKey {
        /// The offending key.
        value: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// The advisory lock is held by another owner.
    #[error("store lock is held by `{holder}`")]
    LockHeld {
        /// Identity recorded by the current lock holder.
        holder: String,
    },

    /// The store pool has been closed and no further handles are issued.
    #[error("store pool is closed")]
    PoolClosed,

    /// Every pool slot is currently in use.
    #[error("store pool has no free slots")]
    PoolBusy,

    /// A document body could not be serialized or deserialized.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An underlying filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for AccordError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::not_found_resource(collection, id),
            StoreError::AlreadyExists { ref id, .. } => {
                Self::conflict(format!("document `{id}` already exists"))
            }
            StoreError::RevisionMismatch { ref id, expected, actual, .. } => Self::conflict(
                format!("document `{id}` was modified concurrently (expected revision {expected}, found {actual})"),
            ),
            other => Self::internal_with_source("storage operation failed", other),
        }
    }
}
