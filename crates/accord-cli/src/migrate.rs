//! The `accord migrate` subcommands.

use std::path::PathBuf;
use std::sync::Arc;

use accord_migrate::{MigrationPlan, MigrationRunner, RevertOutcome, RunOutcome};
use accord_store::{FileStore, SharedStore};

use crate::args::MigrateArgs;
use crate::{settings, EXIT_FAILED, EXIT_NOTHING_TO_DO, EXIT_OK, EXIT_USAGE};

/// Applies every pending migration; prints what happened.
pub async fn run(args: &MigrateArgs) -> i32 {
    let runner = match prepare(args) {
        Ok(runner) => runner,
        Err(message) => {
            eprintln!("{message}");
            return EXIT_USAGE;
        }
    };

    match runner.run().await {
        Ok(RunOutcome::NothingToDo) => {
            println!("nothing to do: all migrations applied");
            EXIT_NOTHING_TO_DO
        }
        Ok(RunOutcome::Applied(keys)) => {
            for key in &keys {
                println!("applied {key}");
            }
            println!("{} migration(s) applied", keys.len());
            EXIT_OK
        }
        Ok(RunOutcome::FailedAt {
            key,
            applied,
            error,
        }) => {
            for done in &applied {
                println!("applied {done}");
            }
            eprintln!("failed at {key}: {error}");
            EXIT_FAILED
        }
        Err(error) => {
            eprintln!("migration run failed: {error}");
            EXIT_FAILED
        }
    }
}

/// Reverts the most recently applied migration.
pub async fn revert(args: &MigrateArgs) -> i32 {
    let runner = match prepare(args) {
        Ok(runner) => runner,
        Err(message) => {
            eprintln!("{message}");
            return EXIT_USAGE;
        }
    };

    match runner.revert().await {
        Ok(RevertOutcome::NothingApplied) => {
            println!("nothing to do: no applied migrations");
            EXIT_NOTHING_TO_DO
        }
        Ok(RevertOutcome::Reverted(key)) => {
            println!("reverted {key}");
            EXIT_OK
        }
        Ok(RevertOutcome::Failed { key, error }) => {
            eprintln!("failed to revert {key}: {error}");
            EXIT_FAILED
        }
        Err(error) => {
            eprintln!("migration revert failed: {error}");
            EXIT_FAILED
        }
    }
}

/// Prints the ledger state of every known migration.
pub async fn show(args: &MigrateArgs) -> i32 {
    let runner = match prepare(args) {
        Ok(runner) => runner,
        Err(message) => {
            eprintln!("{message}");
            return EXIT_USAGE;
        }
    };

    match runner.show().await {
        Ok(statuses) => {
            for status in statuses {
                let state = status
                    .state
                    .map_or_else(|| "pending".to_string(), |s| s.to_string());
                let applied_at = status
                    .applied_at
                    .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
                let marker = if status.in_plan { "" } else { "  (not in plan)" };
                println!("{}  {state}  {applied_at}{marker}", status.key);
            }
            EXIT_OK
        }
        Err(error) => {
            eprintln!("migration show failed: {error}");
            EXIT_FAILED
        }
    }
}

/// Resolves directories from flags and config, opens the store, and
/// loads the plan.
fn prepare(args: &MigrateArgs) -> Result<MigrationRunner, String> {
    let config = settings::load(args.config.as_deref())?;

    let store_dir: PathBuf = args
        .store
        .clone()
        .or_else(|| config.storage.root.as_ref().map(PathBuf::from))
        .ok_or("no store directory: pass --store <dir> or set storage.root")?;

    let migrations_dir: PathBuf = args
        .migrations
        .clone()
        .or_else(|| config.migration.dir.as_ref().map(PathBuf::from))
        .ok_or("no migrations directory: pass --migrations <dir> or set migration.dir")?;

    let store: SharedStore = Arc::new(
        FileStore::open(store_dir).map_err(|e| format!("failed to open store: {e}"))?,
    );
    let plan = MigrationPlan::from_dir(&migrations_dir)
        .map_err(|e| format!("failed to load migrations: {e}"))?;

    Ok(MigrationRunner::new(store, plan).with_lock_holder(config.migration.lock_holder))
}
