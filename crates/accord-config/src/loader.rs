//! Layered configuration loading.
//!
//! Layers apply in order, later overriding earlier: built-in defaults (or
//! a preset), then a TOML/JSON file, then `PREFIX__SECTION__KEY`
//! environment variables. `load` validates the final result.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::config::AccordConfig;
use crate::error::ConfigError;
use crate::sections::{IdentityMode, StorageBackend};

/// Layered configuration loader.
///
/// # Example
///
/// ```no_run
/// use accord_config::ConfigLoader;
///
/// # fn main() -> Result<(), accord_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("accord.toml")?
///     .with_env_prefix("ACCORD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AccordConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AccordConfig::default(),
            env_prefix: None,
        }
    }

    /// Seeds from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AccordConfig::development();
        self
    }

    /// Seeds from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AccordConfig::production();
        self
    }

    /// Loads a TOML or JSON file, replacing the current layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, unreadable, in
    /// an unsupported format, or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Loads a file if it exists, continuing silently otherwise.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Parses configuration from a string in the given format
    /// (`"toml"` or `"json"`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` environment overrides.
    ///
    /// With prefix `ACCORD`:
    /// - `ACCORD__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// - `ACCORD__STORAGE__ROOT=/var/lib/accord`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the process environment, if present.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(self)
    }

    /// Applies environment overrides and validates the result.
    pub fn load(mut self) -> Result<AccordConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Applies environment overrides but skips validation, for callers
    /// that fill in the gaps themselves.
    pub fn load_unvalidated(mut self) -> Result<AccordConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        Ok(self.config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<AccordConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let stripped = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse(key, "invalid key format"))?;
        let parts: Vec<&str> = stripped.split("__").collect();

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => self.config.server.http_addr = value.to_string(),
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = parse_int(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = parse_int(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                self.config.server.max_body_bytes = parse_int(key, value)?;
            }

            ["TELEMETRY", "SERVICE_NAME"] => {
                self.config.telemetry.service_name = value.to_string();
            }
            ["TELEMETRY", "ENVIRONMENT"] => {
                self.config.telemetry.environment = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                self.config.telemetry.logging.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                self.config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "JSON_FORMAT"] => {
                self.config.telemetry.logging.json_format = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                self.config.telemetry.metrics.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => {
                self.config.telemetry.metrics.addr = value.to_string();
            }

            ["IDENTITY", "MODE"] => {
                self.config.identity.mode = match value.to_lowercase().as_str() {
                    "static" => IdentityMode::Static,
                    "claims" => IdentityMode::Claims,
                    _ => {
                        return Err(ConfigError::env_parse(key, "expected 'static' or 'claims'"))
                    }
                };
            }
            ["IDENTITY", "KEYS_URL"] => {
                self.config.identity.keys_url = non_empty(value);
            }
            ["IDENTITY", "LEEWAY_SECS"] => {
                self.config.identity.leeway_secs = parse_int(key, value)?;
            }

            ["CONTRACT", "PATH"] => self.config.contract.path = non_empty(value),
            ["CONTRACT", "BINDINGS_DIR"] => {
                self.config.contract.bindings_dir = non_empty(value);
            }
            ["CONTRACT", "VERIFY_ON_START"] => {
                self.config.contract.verify_on_start = parse_flag(key, value)?;
            }

            ["STORAGE", "BACKEND"] => {
                self.config.storage.backend = match value.to_lowercase().as_str() {
                    "memory" => StorageBackend::Memory,
                    "file" => StorageBackend::File,
                    _ => return Err(ConfigError::env_parse(key, "expected 'memory' or 'file'")),
                };
            }
            ["STORAGE", "ROOT"] => self.config.storage.root = non_empty(value),
            ["STORAGE", "POOL_CAPACITY"] => {
                self.config.storage.pool_capacity = parse_int(key, value)?;
            }

            ["MIGRATION", "DIR"] => self.config.migration.dir = non_empty(value),
            ["MIGRATION", "AUTO_RUN"] => {
                self.config.migration.auto_run = parse_flag(key, value)?;
            }
            ["MIGRATION", "LOCK_HOLDER"] => {
                self.config.migration.lock_holder = value.to_string();
            }

            // Unknown keys under the prefix are ignored.
            _ => {}
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse(key, "expected boolean")),
    }
}
