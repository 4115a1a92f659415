//! Migration error types.

use accord_core::AccordError;
use accord_store::StoreError;
use thiserror::Error;

use crate::key::MigrationKey;

/// Result alias for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Errors produced while validating or executing migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration key does not match `YYYYMMDDHHMMSS_slug`.
    #[error("invalid migration key `{value}`: {reason}")]
    InvalidKey {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two migrations in the same plan share a key.
    #[error("duplicate migration key `{key}`")]
    DuplicateKey {
        /// The duplicated key.
        key: MigrationKey,
    },

    /// The ledger skips over a known migration.
    ///
    /// Applied migrations must form a contiguous prefix of the plan: if
    /// `found` is recorded as applied, every earlier key must be too.
    #[error("migration ledger has a gap: `{expected}` was never applied but `{found}` was")]
    LedgerGap {
        /// The earliest known key missing from the ledger.
        expected: MigrationKey,
        /// The applied key that sits after the gap.
        found: MigrationKey,
    },

    /// The ledger records a migration the plan does not know.
    #[error("migration ledger records unknown migration `{key}`")]
    UnknownLedgerEntry {
        /// The unrecognized key.
        key: MigrationKey,
    },

    /// A migration's content changed after it was applied.
    #[error("checksum mismatch for applied migration `{key}`: its steps changed after it was applied")]
    ChecksumMismatch {
        /// The tampered key.
        key: MigrationKey,
    },

    /// A previous run crashed mid-apply and left an in-progress marker.
    #[error(
        "migration `{key}` was interrupted mid-apply; inspect the data, then resolve the ledger before running again"
    )]
    Interrupted {
        /// The migration whose ledger entry is stuck in the applying state.
        key: MigrationKey,
    },

    /// A migration step could not be applied.
    #[error("migration `{key}` failed at step {step}: {message}")]
    StepFailed {
        /// The migration being applied.
        key: MigrationKey,
        /// Zero-based index of the failing step.
        step: usize,
        /// What went wrong.
        message: String,
    },

    /// An inverse step could not be applied during revert or rollback.
    #[error("revert of migration `{key}` failed at step {step}: {message}")]
    RevertFailed {
        /// The migration being reverted.
        key: MigrationKey,
        /// Zero-based index of the step whose inverse failed.
        step: usize,
        /// What went wrong.
        message: String,
    },

    /// A migration script could not be parsed.
    #[error("invalid migration script: {0}")]
    Script(#[from] serde_json::Error),

    /// A script file could not be read.
    #[error("migration script I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<MigrationError> for AccordError {
    fn from(err: MigrationError) -> Self {
        Self::migration(err.to_string())
    }
}
