//! Schema migrations for Accord stores.
//!
//! Migrations are ordered by timestamped keys, tracked in a ledger that
//! lives inside the store they manage, and executed by a runner that
//! refuses to proceed when the ledger disagrees with the plan. Script
//! migrations are JSON step lists with derivable inverses; code
//! migrations implement the [`Migration`] trait directly.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use accord_migrate::{MigrationKey, MigrationPlan, MigrationRunner, RunOutcome, ScriptMigration};
//! use accord_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), accord_migrate::MigrationError> {
//! let key: MigrationKey = "20240101120000_create_notes".parse()?;
//! let script = ScriptMigration::from_json_str(
//!     key,
//!     r#"{ "steps": [ { "op": "create_collection", "collection": "notes" } ] }"#,
//! )?;
//!
//! let plan = MigrationPlan::new(vec![Box::new(script)])?;
//! let runner = MigrationRunner::new(Arc::new(MemoryStore::new()), plan);
//! assert!(matches!(runner.run().await?, RunOutcome::Applied(_)));
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/accord-migrate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod key;
mod ledger;
mod migration;
mod plan;
mod runner;
mod script;
mod steps;

pub use error::{MigrationError, MigrationResult};
pub use key::MigrationKey;
pub use ledger::{Ledger, LedgerEntry, MigrationState, LEDGER_PREFIX};
pub use migration::{Migration, MigrationFuture};
pub use plan::MigrationPlan;
pub use runner::{
    MigrationRunner, MigrationStatus, RevertOutcome, RunOutcome, DEFAULT_LOCK_HOLDER,
};
pub use script::{load_dir, ScriptMigration, SCRIPT_EXTENSION};
pub use steps::{StashSlot, Step};
