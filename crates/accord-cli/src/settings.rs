//! Configuration loading shared by the subcommands.

use std::path::Path;

use accord_config::{AccordConfig, ConfigLoader};

/// Loads layered configuration for a command invocation.
///
/// Validation is skipped: flags may supply what the config omits, and
/// each subcommand reports its own missing pieces.
pub fn load(config_path: Option<&Path>) -> Result<AccordConfig, String> {
    let loader = ConfigLoader::new();
    let loader = match config_path {
        Some(path) => loader
            .with_file(path)
            .map_err(|e| format!("failed to load config: {e}"))?,
        None => loader,
    };
    loader
        .with_env_prefix("ACCORD")
        .load_unvalidated()
        .map_err(|e| format!("failed to load config: {e}"))
}
