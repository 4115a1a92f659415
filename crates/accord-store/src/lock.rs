//! Advisory store lock.
//!
//! Long-running maintenance work (schema migrations, most importantly)
//! takes an exclusive advisory lock before touching data. The lock is a
//! document insert: whoever inserts the lock document owns the lock, and
//! everyone else sees [`StoreError::LockHeld`] with the holder's name. It
//! protects cooperating writers only; it does not stop code that ignores
//! it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{StoreError, StoreResult};
use crate::store::SharedStore;

/// Collection that holds system documents such as the advisory lock.
pub const SYSTEM_COLLECTION: &str = "__accord";

/// Document ID of the advisory lock.
pub const LOCK_DOCUMENT: &str = "lock";

/// Body of the advisory lock document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Name the holder registered when acquiring.
    pub holder: String,
    /// When the lock was acquired, RFC 3339.
    pub acquired_at: String,
}

/// An acquired advisory lock.
///
/// The lock is released by calling [`StoreLock::release`]. It is not
/// released on drop: release is a storage write, and failing it silently
/// in a destructor would hide exactly the condition the lock exists to
/// surface. A lock left behind by a crashed process is visible via
/// [`StoreLock::current`] and cleared with [`StoreLock::force_release`].
pub struct StoreLock {
    store: SharedStore,
    holder: String,
}

impl fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLock")
            .field("holder", &self.holder)
            .finish_non_exhaustive()
    }
}

impl StoreLock {
    /// Acquires the advisory lock on behalf of `holder`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockHeld`] naming the current holder when the
    /// lock is already taken, or another [`StoreError`] if storage fails.
    pub async fn acquire(store: SharedStore, holder: impl Into<String>) -> StoreResult<Self> {
        let holder = holder.into();
        store.create_collection(SYSTEM_COLLECTION).await?;

        let info = json!({
            "holder": holder,
            "acquired_at": chrono::Utc::now().to_rfc3339(),
        });
        match store.insert(SYSTEM_COLLECTION, LOCK_DOCUMENT, info).await {
            Ok(_) => {
                tracing::debug!(holder = %holder, "acquired store lock");
                Ok(Self { store, holder })
            }
            Err(StoreError::AlreadyExists { .. }) => {
                let current = Self::current(&store).await?;
                Err(StoreError::LockHeld {
                    holder: current.map_or_else(|| "unknown".to_string(), |info| info.holder),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Returns the holder of this lock.
    #[must_use]
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Releases the lock.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`StoreError`] if the delete fails; the lock
    /// document may still be present in that case.
    pub async fn release(self) -> StoreResult<()> {
        self.store.delete(SYSTEM_COLLECTION, LOCK_DOCUMENT).await?;
        tracing::debug!(holder = %self.holder, "released store lock");
        Ok(())
    }

    /// Reads the current lock document, if any.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`StoreError`] if storage fails.
    pub async fn current(store: &SharedStore) -> StoreResult<Option<LockInfo>> {
        if store.create_collection(SYSTEM_COLLECTION).await? {
            return Ok(None);
        }
        match store.get(SYSTEM_COLLECTION, LOCK_DOCUMENT).await? {
            Some(doc) => Ok(Some(doc.body_as()?)),
            None => Ok(None),
        }
    }

    /// Removes the lock document regardless of holder.
    ///
    /// For operator use after a crashed process left the lock behind.
    /// Returns `true` if a lock document was removed.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`StoreError`] if storage fails.
    pub async fn force_release(store: &SharedStore) -> StoreResult<bool> {
        store.create_collection(SYSTEM_COLLECTION).await?;
        let removed = store.delete(SYSTEM_COLLECTION, LOCK_DOCUMENT).await?;
        if removed {
            tracing::warn!("store lock force-released");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::memory::MemoryStore;

    use super::*;

    fn shared_store() -> SharedStore {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let store = shared_store();
        let lock = StoreLock::acquire(Arc::clone(&store), "migrate-1").await.unwrap();
        assert_eq!(lock.holder(), "migrate-1");
        assert!(StoreLock::current(&store).await.unwrap().is_some());

        lock.release().await.unwrap();
        assert!(StoreLock::current(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_debug_names_holder_not_store() {
        let lock = StoreLock::acquire(shared_store(), "migrate-1").await.unwrap();
        let rendered = format!("{lock:?}");
        assert!(rendered.contains("migrate-1"));
    }

    #[tokio::test]
    async fn test_second_acquire_names_holder() {
        let store = shared_store();
        let _lock = StoreLock::acquire(Arc::clone(&store), "migrate-1").await.unwrap();

        let err = StoreLock::acquire(Arc::clone(&store), "migrate-2").await.unwrap_err();
        assert!(matches!(err, StoreError::LockHeld { ref holder } if holder == "migrate-1"));
    }

    #[tokio::test]
    async fn test_reacquire_after_release() {
        let store = shared_store();
        let lock = StoreLock::acquire(Arc::clone(&store), "first").await.unwrap();
        lock.release().await.unwrap();

        let lock = StoreLock::acquire(Arc::clone(&store), "second").await.unwrap();
        assert_eq!(lock.holder(), "second");
    }

    #[tokio::test]
    async fn test_force_release_clears_abandoned_lock() {
        let store = shared_store();
        let _abandoned = StoreLock::acquire(Arc::clone(&store), "crashed").await.unwrap();

        assert!(StoreLock::force_release(&store).await.unwrap());
        assert!(!StoreLock::force_release(&store).await.unwrap());
        assert!(StoreLock::acquire(store, "fresh").await.is_ok());
    }

    #[tokio::test]
    async fn test_current_on_fresh_store() {
        let store = shared_store();
        assert!(StoreLock::current(&store).await.unwrap().is_none());
    }
}
