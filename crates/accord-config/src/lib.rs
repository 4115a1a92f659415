//! Layered configuration for Accord services.
//!
//! Configuration assembles from three layers, each overriding the last:
//! built-in defaults (or a preset), a TOML/JSON file, and
//! `ACCORD__SECTION__KEY` environment variables. The assembled
//! [`AccordConfig`] is validated before use.
//!
//! # Example
//!
//! ```
//! use accord_config::{ConfigLoader, StorageBackend};
//!
//! # fn main() -> Result<(), accord_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_string("[storage]\nbackend = \"memory\"", "toml")?
//!     .load()?;
//! assert_eq!(config.storage.backend, StorageBackend::Memory);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod sections;

pub use config::AccordConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use sections::{
    ContractSection, IdentityConfig, IdentityMode, LogSection, MetricsSection, MigrationConfig,
    ServerConfig, StaticToken, StorageBackend, StorageConfig, TelemetrySection,
};
