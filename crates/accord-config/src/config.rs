//! The top-level configuration type.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sections::{
    ContractSection, IdentityConfig, IdentityMode, MigrationConfig, ServerConfig, StorageBackend,
    StorageConfig, TelemetrySection,
};

/// Complete Accord service configuration.
///
/// Load through [`ConfigLoader`](crate::ConfigLoader), which layers
/// defaults, a file, and environment overrides, then validates.
///
/// # Example
///
/// ```
/// use accord_config::AccordConfig;
///
/// let config = AccordConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct AccordConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging and metrics settings.
    pub telemetry: TelemetrySection,
    /// Identity gate settings.
    pub identity: IdentityConfig,
    /// Contract store settings.
    pub contract: ContractSection,
    /// Storage backend settings.
    pub storage: StorageConfig,
    /// Migration engine settings.
    pub migration: MigrationConfig,
}

impl AccordConfig {
    /// Validates the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an address does not parse, the file
    /// backend has no root, or a mode is missing the settings it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.telemetry.metrics.enabled
            && self
                .telemetry
                .metrics
                .addr
                .parse::<std::net::SocketAddr>()
                .is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        if self.storage.backend == StorageBackend::File && self.storage.root.is_none() {
            return Err(ConfigError::validation(
                "storage.root must be set when storage.backend is 'file'",
            ));
        }

        if self.migration.auto_run && self.migration.dir.is_none() {
            return Err(ConfigError::validation(
                "migration.dir must be set when migration.auto_run is enabled",
            ));
        }

        if self.identity.mode == IdentityMode::Static && self.identity.static_tokens.is_empty() {
            return Err(ConfigError::validation(
                "identity.static_tokens must not be empty when identity.mode is 'static'",
            ));
        }

        Ok(())
    }

    /// Development preset: human-readable debug logs, in-memory storage,
    /// and a fixture identity.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.environment = "development".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.json_format = false;
        config.storage.backend = StorageBackend::Memory;
        config.identity.mode = IdentityMode::Static;
        config.identity.static_tokens = vec![crate::sections::StaticToken {
            token: "dev-token".to_string(),
            subject: "dev-user".to_string(),
            roles: vec!["admin".to_string()],
        }];
        config
    }

    /// Production preset: JSON info logs, metrics on, strict startup
    /// verification.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.environment = "production".to_string();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.json_format = true;
        config.telemetry.metrics.enabled = true;
        config.contract.verify_on_start = true;
        config
    }
}
