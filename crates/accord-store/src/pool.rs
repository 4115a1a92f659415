//! Scoped access to a shared storage backend.
//!
//! Services never hold a raw [`Store`](crate::Store) reference for the
//! lifetime of the process. They acquire a [`StoreHandle`] per unit of
//! work from the [`StorePool`], use it, and drop it, which returns the
//! slot to the pool. The pool caps how many units of work touch storage
//! concurrently.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{StoreError, StoreResult};
use crate::store::{SharedStore, Store};

/// A capacity-bounded pool of storage access slots.
///
/// Cloning the pool is cheap; clones share the same backend and the same
/// slot budget.
#[derive(Clone)]
pub struct StorePool {
    store: SharedStore,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl StorePool {
    /// Creates a pool over `store` with `capacity` concurrent slots.
    ///
    /// A zero capacity is treated as one slot, so the pool can always make
    /// progress.
    #[must_use]
    pub fn new(store: SharedStore, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            store,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Acquires a storage handle, waiting for a free slot if the pool is
    /// saturated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PoolClosed`] once [`StorePool::close`] has
    /// been called.
    pub async fn acquire(&self) -> StoreResult<StoreHandle> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StoreError::PoolClosed)?;
        Ok(StoreHandle {
            store: Arc::clone(&self.store),
            _permit: permit,
        })
    }

    /// Acquires a handle without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PoolBusy`] when every slot is taken and
    /// [`StoreError::PoolClosed`] once the pool has been closed.
    pub fn try_acquire(&self) -> StoreResult<StoreHandle> {
        let permit = Arc::clone(&self.permits).try_acquire_owned().map_err(|err| match err {
            tokio::sync::TryAcquireError::Closed => StoreError::PoolClosed,
            tokio::sync::TryAcquireError::NoPermits => StoreError::PoolBusy,
        })?;
        Ok(StoreHandle {
            store: Arc::clone(&self.store),
            _permit: permit,
        })
    }

    /// Closes the pool. In-flight handles stay valid; new acquisitions
    /// fail.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Returns the configured slot capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many slots are currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl fmt::Debug for StorePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorePool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish_non_exhaustive()
    }
}

/// A scoped handle onto the pooled store.
///
/// The handle dereferences to the [`Store`] trait, so call sites read the
/// same as direct store access. Dropping the handle frees its pool slot.
pub struct StoreHandle {
    store: SharedStore,
    _permit: OwnedSemaphorePermit,
}

impl Deref for StoreHandle {
    type Target = dyn Store;

    fn deref(&self) -> &Self::Target {
        &*self.store
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}
