//! The migration runner.
//!
//! [`MigrationRunner`] drives a [`MigrationPlan`] against one store. Every
//! mutating entry point takes two locks: an in-process mutex so concurrent
//! tasks in the same process serialize, and the advisory
//! [`StoreLock`] so a second process sees who holds the store instead of
//! corrupting it.
//!
//! Before running anything, the runner verifies the ledger against the
//! plan: no entry stuck in the applying state, no entry the plan does not
//! know, applied entries forming a contiguous prefix of the plan, and
//! checksums unchanged since apply time. Verification never writes, so a
//! failed check leaves the store exactly as it found it.

use accord_store::{SharedStore, StoreLock};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{MigrationError, MigrationResult};
use crate::key::MigrationKey;
use crate::ledger::{Ledger, LedgerEntry, MigrationState};
use crate::plan::MigrationPlan;

/// Default holder name written into the advisory lock.
pub const DEFAULT_LOCK_HOLDER: &str = "migrate-run";

/// What a [`MigrationRunner::run`] call did.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every migration in the plan was already applied.
    NothingToDo,
    /// These migrations were applied, in order.
    Applied(Vec<MigrationKey>),
    /// A migration failed partway through the run.
    ///
    /// Migrations in `applied` completed and stay applied; `key` is left
    /// with an applying marker in the ledger for inspection.
    FailedAt {
        /// The migration that failed.
        key: MigrationKey,
        /// Migrations applied earlier in this same run.
        applied: Vec<MigrationKey>,
        /// Why it failed.
        error: MigrationError,
    },
}

/// What a [`MigrationRunner::revert`] call did.
#[derive(Debug)]
pub enum RevertOutcome {
    /// The ledger records no applied migration.
    NothingApplied,
    /// The most recently applied migration was reverted.
    Reverted(MigrationKey),
    /// The revert failed; the migration stays recorded as applied.
    Failed {
        /// The migration whose revert failed.
        key: MigrationKey,
        /// Why it failed.
        error: MigrationError,
    },
}

/// Status of one migration as reported by [`MigrationRunner::show`].
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// The migration key.
    pub key: MigrationKey,
    /// Ledger state, or `None` when pending.
    pub state: Option<MigrationState>,
    /// When the migration finished applying, if it did.
    pub applied_at: Option<DateTime<Utc>>,
    /// Whether the plan knows this key. `false` flags a ledger entry
    /// whose migration has disappeared from the plan.
    pub in_plan: bool,
}

/// Executes a migration plan against a store.
pub struct MigrationRunner {
    store: SharedStore,
    plan: MigrationPlan,
    holder: String,
    guard: Mutex<()>,
}

impl MigrationRunner {
    /// Creates a runner for `plan` over `store`.
    #[must_use]
    pub fn new(store: SharedStore, plan: MigrationPlan) -> Self {
        Self {
            store,
            plan,
            holder: DEFAULT_LOCK_HOLDER.to_string(),
            guard: Mutex::new(()),
        }
    }

    /// Overrides the holder name recorded in the advisory lock.
    #[must_use]
    pub fn with_lock_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    /// The plan this runner executes.
    #[must_use]
    pub fn plan(&self) -> &MigrationPlan {
        &self.plan
    }

    /// Applies every pending migration, in order, stopping at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns an error when the ledger fails verification or a lock
    /// cannot be taken. A migration failing mid-run is not an `Err`; it is
    /// reported as [`RunOutcome::FailedAt`] so callers still see what was
    /// applied before the failure.
    pub async fn run(&self) -> MigrationResult<RunOutcome> {
        let _guard = self.guard.lock().await;
        let lock = StoreLock::acquire(self.store.clone(), self.holder.clone()).await?;
        let outcome = self.run_locked().await;
        if let Err(release_err) = lock.release().await {
            return outcome.and(Err(release_err.into()));
        }
        outcome
    }

    async fn run_locked(&self) -> MigrationResult<RunOutcome> {
        let ledger = Ledger::open(self.store.as_ref()).await?;
        let entries = ledger.entries().await?;
        self.verify(&entries)?;

        let applied_keys: Vec<&MigrationKey> = entries
            .iter()
            .filter(|e| e.state == MigrationState::Applied)
            .map(|e| &e.key)
            .collect();

        let pending: Vec<_> = self
            .plan
            .iter()
            .filter(|m| !applied_keys.contains(&m.key()))
            .collect();
        if pending.is_empty() {
            return Ok(RunOutcome::NothingToDo);
        }

        let mut applied = Vec::new();
        for migration in pending {
            let key = migration.key().clone();
            tracing::info!(migration = %key, "applying migration");
            ledger.mark_applying(&key, migration.checksum()).await?;
            match migration.apply(self.store.as_ref()).await {
                Ok(()) => {
                    ledger.mark_applied(&key).await?;
                    tracing::info!(migration = %key, "migration applied");
                    applied.push(key);
                }
                Err(error) => {
                    // The applying marker stays behind as evidence.
                    tracing::error!(migration = %key, error = %error, "migration failed");
                    return Ok(RunOutcome::FailedAt {
                        key,
                        applied,
                        error,
                    });
                }
            }
        }
        Ok(RunOutcome::Applied(applied))
    }

    /// Reverts the most recently applied migration, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the ledger fails verification or a lock
    /// cannot be taken. A failing inverse is reported as
    /// [`RevertOutcome::Failed`].
    pub async fn revert(&self) -> MigrationResult<RevertOutcome> {
        let _guard = self.guard.lock().await;
        let lock = StoreLock::acquire(self.store.clone(), self.holder.clone()).await?;
        let outcome = self.revert_locked().await;
        if let Err(release_err) = lock.release().await {
            return outcome.and(Err(release_err.into()));
        }
        outcome
    }

    async fn revert_locked(&self) -> MigrationResult<RevertOutcome> {
        let ledger = Ledger::open(self.store.as_ref()).await?;
        let entries = ledger.entries().await?;
        self.verify(&entries)?;

        let Some(last) = entries
            .iter()
            .rev()
            .find(|e| e.state == MigrationState::Applied)
        else {
            return Ok(RevertOutcome::NothingApplied);
        };
        let key = last.key.clone();

        // Verification guarantees the plan knows every ledger entry.
        let Some(migration) = self.plan.get(&key) else {
            return Err(MigrationError::UnknownLedgerEntry { key });
        };

        tracing::info!(migration = %key, "reverting migration");
        match migration.revert(self.store.as_ref()).await {
            Ok(()) => {
                ledger.remove(&key).await?;
                tracing::info!(migration = %key, "migration reverted");
                Ok(RevertOutcome::Reverted(key))
            }
            Err(error) => {
                tracing::error!(migration = %key, error = %error, "revert failed");
                Ok(RevertOutcome::Failed { key, error })
            }
        }
    }

    /// Reports the status of every migration the plan or the ledger
    /// knows, in key order. Read-only.
    pub async fn show(&self) -> MigrationResult<Vec<MigrationStatus>> {
        let ledger = Ledger::open(self.store.as_ref()).await?;
        let entries = ledger.entries().await?;

        let mut statuses: Vec<MigrationStatus> = self
            .plan
            .keys()
            .map(|key| {
                let entry = entries.iter().find(|e| &e.key == key);
                MigrationStatus {
                    key: key.clone(),
                    state: entry.map(|e| e.state),
                    applied_at: entry.and_then(|e| e.applied_at),
                    in_plan: true,
                }
            })
            .collect();
        for entry in &entries {
            if self.plan.get(&entry.key).is_none() {
                statuses.push(MigrationStatus {
                    key: entry.key.clone(),
                    state: Some(entry.state),
                    applied_at: entry.applied_at,
                    in_plan: false,
                });
            }
        }
        statuses.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(statuses)
    }

    /// Checks the ledger against the plan without writing anything.
    fn verify(&self, entries: &[LedgerEntry]) -> MigrationResult<()> {
        for entry in entries {
            if entry.state == MigrationState::Applying {
                return Err(MigrationError::Interrupted {
                    key: entry.key.clone(),
                });
            }
            let Some(migration) = self.plan.get(&entry.key) else {
                return Err(MigrationError::UnknownLedgerEntry {
                    key: entry.key.clone(),
                });
            };
            if let (Some(recorded), Some(current)) = (&entry.checksum, migration.checksum()) {
                if *recorded != current {
                    return Err(MigrationError::ChecksumMismatch {
                        key: entry.key.clone(),
                    });
                }
            }
        }

        // Applied entries must form a contiguous prefix of the plan.
        let mut first_missing: Option<&MigrationKey> = None;
        for key in self.plan.keys() {
            let applied = entries
                .iter()
                .any(|e| &e.key == key && e.state == MigrationState::Applied);
            match (applied, first_missing) {
                (true, Some(expected)) => {
                    return Err(MigrationError::LedgerGap {
                        expected: expected.clone(),
                        found: key.clone(),
                    });
                }
                (false, None) => first_missing = Some(key),
                _ => {}
            }
        }
        Ok(())
    }
}
