//! One-call service startup from configuration.
//!
//! [`prepare`] turns a validated [`AccordConfig`] into the pieces a
//! hosted service composes with its own registry and verifier: the
//! loaded contract and a ready store pool. Along the way it honors the
//! startup knobs the configuration declares:
//!
//! - telemetry initialization (logging and the metrics exporter),
//! - `contract.verify_on_start`: binding drift check against the
//!   manifest in `contract.bindings_dir`,
//! - `migration.auto_run`: pending migrations applied before serving.

use std::sync::Arc;

use accord_codegen::BindingManifest;
use accord_config::{AccordConfig, ConfigError, StorageBackend};
use accord_contract::{store::load_path, Contract, ContractError};
use accord_migrate::{MigrationError, MigrationKey, MigrationPlan, MigrationRunner, RunOutcome};
use accord_store::{FileStore, MemoryStore, SharedStore, StoreError, StorePool};
use accord_telemetry::metrics::{record_contract_verification, record_migration};
use accord_telemetry::{init_telemetry, LogConfig, MetricsConfig, TelemetryError};
use thiserror::Error;

/// A failure during service startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The configuration failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// The contract could not be loaded, or its bindings drifted.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
    /// The store could not be opened.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Migrations could not be loaded or run.
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
    /// Telemetry could not be initialized.
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    /// A startup migration failed partway through.
    #[error("startup migration failed at {key}: {error}")]
    MigrationFailed {
        /// The migration that failed.
        key: MigrationKey,
        /// Why it failed.
        error: MigrationError,
    },
    /// The configuration omits something startup needs.
    #[error("{0}")]
    Incomplete(String),
}

/// Startup products a hosted service builds its server from.
#[derive(Debug)]
pub struct Runtime {
    /// The loaded, verified contract.
    pub contract: Contract,
    /// Store pool sized per `storage.pool_capacity`.
    pub pool: Arc<StorePool>,
    /// The validated configuration, for the server builder.
    pub config: AccordConfig,
}

/// Prepares a service for startup from its configuration.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the first startup step that
/// failed; nothing is served when any step fails.
pub async fn prepare(config: AccordConfig) -> Result<Runtime, BootstrapError> {
    config.validate()?;
    init_telemetry(&log_config(&config), &metrics_config(&config))?;

    let contract = load_contract(&config)?;
    let store = open_store(&config)?;
    run_startup_migrations(&config, &store).await?;

    let pool = Arc::new(StorePool::new(store, config.storage.pool_capacity));
    Ok(Runtime {
        contract,
        pool,
        config,
    })
}

fn log_config(config: &AccordConfig) -> LogConfig {
    LogConfig {
        enabled: config.telemetry.logging.enabled,
        level: config.telemetry.logging.level.clone(),
        json_format: config.telemetry.logging.json_format,
        service_name: config.telemetry.service_name.clone(),
        ..LogConfig::default()
    }
}

fn metrics_config(config: &AccordConfig) -> MetricsConfig {
    MetricsConfig {
        enabled: config.telemetry.metrics.enabled,
        addr: config.telemetry.metrics.addr.clone(),
    }
}

fn load_contract(config: &AccordConfig) -> Result<Contract, BootstrapError> {
    let Some(path) = config.contract.path.as_ref() else {
        return Err(BootstrapError::Incomplete(
            "contract.path is required to start a service".to_string(),
        ));
    };
    let contract = load_path(path)?;
    tracing::info!(
        service = contract.service(),
        version = contract.version(),
        "contract loaded"
    );

    if config.contract.verify_on_start {
        let Some(dir) = config.contract.bindings_dir.as_ref() else {
            return Err(BootstrapError::Incomplete(
                "contract.bindings_dir is required when contract.verify_on_start is set"
                    .to_string(),
            ));
        };
        let manifest = BindingManifest::load(dir.as_ref())?;
        if let Err(error) = manifest.verify_against(&contract) {
            record_contract_verification("drift");
            return Err(error.into());
        }
        record_contract_verification("ok");
        tracing::info!(bindings_dir = %dir, "bindings verified against contract");
    }

    Ok(contract)
}

fn open_store(config: &AccordConfig) -> Result<SharedStore, BootstrapError> {
    match config.storage.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::File => {
            let Some(root) = config.storage.root.as_ref() else {
                return Err(BootstrapError::Incomplete(
                    "storage.root is required for the file backend".to_string(),
                ));
            };
            Ok(Arc::new(FileStore::open(root)?))
        }
    }
}

async fn run_startup_migrations(
    config: &AccordConfig,
    store: &SharedStore,
) -> Result<(), BootstrapError> {
    if !config.migration.auto_run {
        return Ok(());
    }
    let Some(dir) = config.migration.dir.as_ref() else {
        return Err(BootstrapError::Incomplete(
            "migration.dir is required when migration.auto_run is set".to_string(),
        ));
    };

    let plan = MigrationPlan::from_dir(dir.as_ref())?;
    let runner = MigrationRunner::new(Arc::clone(store), plan)
        .with_lock_holder(config.migration.lock_holder.clone());

    match runner.run().await? {
        RunOutcome::NothingToDo => {
            tracing::info!("no pending migrations");
        }
        RunOutcome::Applied(keys) => {
            for key in &keys {
                record_migration("applied");
                tracing::info!(migration = %key, "migration applied at startup");
            }
        }
        RunOutcome::FailedAt { key, error, .. } => {
            record_migration("failed");
            return Err(BootstrapError::MigrationFailed { key, error });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use accord_contract::{Endpoint, Schema};

    fn contract_file(dir: &std::path::Path) -> String {
        let contract = Contract::builder("notes")
            .version("1.0.0")
            .schema("Note", Schema::object(vec![("id", Schema::string())]))
            .endpoint(
                Endpoint::builder("listNotes")
                    .path("/notes")
                    .response(200, Some("Note"))
                    .build(),
            )
            .build()
            .unwrap();
        let path = dir.join("contract.json");
        fs::write(
            &path,
            serde_json::to_string(&contract.to_document()).unwrap(),
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    fn base_config(dir: &TempDir) -> AccordConfig {
        let mut config = AccordConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.contract.path = Some(contract_file(dir.path()));
        // A process can install one global subscriber; tests stay off it.
        config.telemetry.logging.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_prepare_loads_contract_and_pool() {
        let dir = TempDir::new().unwrap();
        let runtime = prepare(base_config(&dir)).await.unwrap();
        assert_eq!(runtime.contract.service(), "notes");
        assert!(runtime.pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_prepare_requires_a_contract_path() {
        let dir = TempDir::new().unwrap();
        let mut config = base_config(&dir);
        config.contract.path = None;

        let err = prepare(config).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Incomplete(_)));
    }

    #[tokio::test]
    async fn test_auto_run_applies_pending_migrations() {
        let dir = TempDir::new().unwrap();
        let migrations = TempDir::new().unwrap();
        fs::write(
            migrations.path().join("20240101120000_create_notes.json"),
            r#"{"steps": [{"op": "create_collection", "collection": "notes"}]}"#,
        )
        .unwrap();

        let mut config = base_config(&dir);
        config.migration.auto_run = true;
        config.migration.dir = Some(migrations.path().to_string_lossy().into_owned());

        let runtime = prepare(config).await.unwrap();
        let handle = runtime.pool.acquire().await.unwrap();
        assert!(handle.collections().await.unwrap().contains(&"notes".to_string()));
    }

    #[tokio::test]
    async fn test_verify_on_start_without_bindings_dir_is_incomplete() {
        let dir = TempDir::new().unwrap();
        let mut config = base_config(&dir);
        config.contract.verify_on_start = true;

        let err = prepare(config).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Incomplete(_)));
    }
}
