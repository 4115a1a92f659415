//! Individual configuration sections.

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub http_addr: String,
    /// Per-request deadline covering body collection and dispatch.
    pub request_timeout_ms: u64,
    /// How long graceful shutdown waits for in-flight requests.
    pub shutdown_timeout_secs: u64,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 10_000,
            shutdown_timeout_secs: 30,
            max_body_bytes: 1_048_576,
        }
    }
}

/// Telemetry settings: service identity plus logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TelemetrySection {
    /// Service name stamped onto logs and metrics.
    pub service_name: String,
    /// Deployment environment name.
    pub environment: String,
    /// Structured logging settings.
    pub logging: LogSection,
    /// Prometheus metrics settings.
    pub metrics: MetricsSection,
}

/// Structured logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogSection {
    /// Whether logging initializes at all.
    pub enabled: bool,
    /// Default level filter, `RUST_LOG` syntax.
    pub level: String,
    /// JSON output when `true`, human-readable otherwise.
    pub json_format: bool,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
        }
    }
}

/// Prometheus metrics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MetricsSection {
    /// Whether the Prometheus exporter starts.
    pub enabled: bool,
    /// Socket address the exporter listens on.
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            service_name: "accord-service".to_string(),
            environment: "local".to_string(),
            logging: LogSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

/// Which verifier backs the identity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Fixture token map; development and tests only.
    Static,
    /// JWT claims decoding, trusting an upstream signature check.
    Claims,
}

/// Identity gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IdentityConfig {
    /// Which verifier to construct.
    pub mode: IdentityMode,
    /// Issuer key material URL, for verifiers that need it.
    pub keys_url: Option<String>,
    /// Clock-skew leeway in seconds applied to token expiry.
    pub leeway_secs: i64,
    /// Fixture tokens for [`IdentityMode::Static`].
    pub static_tokens: Vec<StaticToken>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Claims,
            keys_url: None,
            leeway_secs: 0,
            static_tokens: Vec::new(),
        }
    }
}

/// One fixture token entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticToken {
    /// The literal bearer token.
    pub token: String,
    /// Subject the token resolves to.
    pub subject: String,
    /// Roles granted to that subject.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Contract store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct ContractSection {
    /// Contract document file or directory.
    pub path: Option<String>,
    /// Directory holding the generated binding set.
    pub bindings_dir: Option<String>,
    /// Verify the binding manifest at startup; opt-in, needs
    /// `bindings_dir`.
    pub verify_on_start: bool,
}

/// Which storage backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// In-process store; data is lost on exit.
    Memory,
    /// Filesystem store rooted at `storage.root`.
    File,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Root directory for the file backend.
    pub root: Option<String>,
    /// Concurrent store access slots.
    pub pool_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            root: None,
            pool_capacity: 8,
        }
    }
}

/// Migration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MigrationConfig {
    /// Directory holding migration scripts.
    pub dir: Option<String>,
    /// Apply pending migrations during server startup.
    pub auto_run: bool,
    /// Holder name recorded in the advisory store lock.
    pub lock_holder: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            dir: None,
            auto_run: false,
            lock_holder: "migrate-run".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.http_addr, "0.0.0.0:8080");
        assert_eq!(server.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_identity_defaults_to_claims_mode() {
        let identity = IdentityConfig::default();
        assert_eq!(identity.mode, IdentityMode::Claims);
        assert!(identity.static_tokens.is_empty());
    }

    #[test]
    fn test_telemetry_defaults_carry_service_identity() {
        let telemetry = TelemetrySection::default();
        assert_eq!(telemetry.service_name, "accord-service");
        assert_eq!(telemetry.environment, "local");
        assert!(telemetry.logging.enabled);
    }

    #[test]
    fn test_contract_verification_is_opt_in() {
        let contract = ContractSection::default();
        assert!(!contract.verify_on_start);
        assert!(contract.bindings_dir.is_none());
    }

    #[test]
    fn test_static_token_roles_default_empty() {
        let token: StaticToken = toml::from_str("token = \"t\"\nsubject = \"user-1\"").unwrap();
        assert!(token.roles.is_empty());
    }

    #[test]
    fn test_section_rejects_unknown_fields() {
        let result: Result<ServerConfig, _> = toml::from_str("surprise = true");
        assert!(result.is_err());
    }
}
