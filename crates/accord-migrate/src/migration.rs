//! The migration abstraction.
//!
//! A [`Migration`] is an ordered, immutable pair of operations: `apply`
//! moves storage forward, `revert` undoes exactly what `apply` did. The
//! runner never calls these directly on unordered sets; it goes through a
//! [`MigrationPlan`](crate::MigrationPlan), which enforces key ordering.

use std::future::Future;
use std::pin::Pin;

use accord_store::Store;

use crate::error::MigrationResult;
use crate::key::MigrationKey;

/// A boxed future returned by [`Migration`] operations.
pub type MigrationFuture<'a> = Pin<Box<dyn Future<Output = MigrationResult<()>> + Send + 'a>>;

/// One reversible unit of schema change.
///
/// Implementations must uphold the round-trip law: for the state the
/// migration was applied to, `revert(apply(state)) == state` for every
/// field the migration touches. Library users implement this trait for
/// code migrations; the CLI path loads
/// [`ScriptMigration`](crate::ScriptMigration)s from disk.
pub trait Migration: Send + Sync + 'static {
    /// The identifier ordering this migration within the plan.
    fn key(&self) -> &MigrationKey;

    /// A digest of the migration's content, when one is meaningful.
    ///
    /// The ledger records this at apply time and refuses to run again if
    /// the content changed afterwards. Code migrations may return `None`;
    /// script migrations always have one.
    fn checksum(&self) -> Option<String> {
        None
    }

    /// Applies this migration against storage.
    fn apply<'a>(&'a self, store: &'a dyn Store) -> MigrationFuture<'a>;

    /// Reverts this migration, restoring the pre-apply state.
    fn revert<'a>(&'a self, store: &'a dyn Store) -> MigrationFuture<'a>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::MigrationError;

    /// A migration that creates one collection, with optional injected
    /// failure for runner tests.
    pub struct FakeMigration {
        key: MigrationKey,
        collection: String,
        pub fail_apply: bool,
        pub applied: Arc<AtomicUsize>,
    }

    impl FakeMigration {
        pub fn new(key: &str, collection: &str) -> Self {
            Self {
                key: key.parse().expect("valid key"),
                collection: collection.to_string(),
                fail_apply: false,
                applied: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(key: &str, collection: &str) -> Self {
            Self {
                fail_apply: true,
                ..Self::new(key, collection)
            }
        }
    }

    impl Migration for FakeMigration {
        fn key(&self) -> &MigrationKey {
            &self.key
        }

        fn apply<'a>(&'a self, store: &'a dyn Store) -> MigrationFuture<'a> {
            Box::pin(async move {
                if self.fail_apply {
                    return Err(MigrationError::StepFailed {
                        key: self.key.clone(),
                        step: 0,
                        message: "injected failure".to_string(),
                    });
                }
                store.create_collection(&self.collection).await?;
                store
                    .put(&self.collection, "marker", json!({"by": self.key.as_str()}))
                    .await?;
                self.applied.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        }

        fn revert<'a>(&'a self, store: &'a dyn Store) -> MigrationFuture<'a> {
            Box::pin(async move {
                store.drop_collection(&self.collection).await?;
                Ok(())
            })
        }
    }
}
