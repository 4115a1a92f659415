//! Prometheus metrics via the `metrics` crate facade.
//!
//! # Standard metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `accord_requests_total` | Counter | `operation`, `status` |
//! | `accord_request_duration_seconds` | Histogram | `operation` |
//! | `accord_in_flight_requests` | Gauge | - |
//! | `accord_validation_failures_total` | Counter | `operation` |
//! | `accord_auth_rejections_total` | Counter | `reason` |
//! | `accord_migrations_total` | Counter | `outcome` |
//! | `accord_contract_verifications_total` | Counter | `outcome` |

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the exporter starts.
    pub enabled: bool,

    /// Address the Prometheus scrape endpoint listens on.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the global Prometheus recorder and scrape listener.
///
/// A no-op when `config.enabled` is false.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the address does not parse or the
/// recorder fails to install.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let handle = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders all metrics in Prometheus text format.
///
/// Returns `None` before [`init_metrics`] runs.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        "accord_requests_total",
        "Total number of dispatched requests"
    );
    describe_histogram!(
        "accord_request_duration_seconds",
        "Request duration in seconds"
    );
    describe_gauge!(
        "accord_in_flight_requests",
        "Requests currently being processed"
    );
    describe_counter!(
        "accord_validation_failures_total",
        "Requests rejected by schema validation"
    );
    describe_counter!(
        "accord_auth_rejections_total",
        "Requests rejected by the identity gate or role check"
    );
    describe_counter!(
        "accord_migrations_total",
        "Migration runs by outcome"
    );
    describe_counter!(
        "accord_contract_verifications_total",
        "Startup contract verifications by outcome"
    );
}

/// Records a completed request.
pub fn record_request(operation: &str, status_code: u16, duration: Duration) {
    counter!(
        "accord_requests_total",
        "operation" => operation.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "accord_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a request rejected by schema validation.
pub fn record_validation_failure(operation: &str) {
    counter!(
        "accord_validation_failures_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Records an authentication or authorization rejection.
pub fn record_auth_rejection(reason: &str) {
    counter!(
        "accord_auth_rejections_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Records the outcome of a migration run, e.g. `"applied"` or `"failed"`.
pub fn record_migration(outcome: &str) {
    counter!(
        "accord_migrations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Records the outcome of a startup contract verification.
pub fn record_contract_verification(outcome: &str) {
    counter!(
        "accord_contract_verifications_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Guard that tracks a request in the in-flight gauge.
///
/// Decrements on drop, so the gauge stays accurate on every exit path.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge and returns the guard.
    #[must_use]
    pub fn new() -> Self {
        gauge!("accord_in_flight_requests").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("accord_in_flight_requests").decrement(1.0);
    }
}
