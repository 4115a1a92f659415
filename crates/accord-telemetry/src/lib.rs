//! Observability for Accord services.
//!
//! Two subsystems, both optional and both driven by configuration:
//!
//! - **Logging**: structured output through `tracing-subscriber`, JSON in
//!   production and pretty in development.
//! - **Metrics**: Prometheus-format metrics through the `metrics` facade,
//!   exposed on a scrape listener.
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::production(), &MetricsConfig::default())?;
//! tracing::info!(operation_id = "createNote", "dispatching");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics in one call.
///
/// # Errors
///
/// Returns [`TelemetryError`] if either subsystem fails to initialize.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)?;
    Ok(())
}
