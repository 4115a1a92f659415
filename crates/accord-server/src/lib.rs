//! HTTP hosting for Accord services.
//!
//! The server owns the transport edge of the system: it accepts HTTP/1.1
//! connections, routes requests through the contract, applies the
//! identity gate per endpoint, and hands validated work to the operation
//! pipeline. Everything that leaves the server is an envelope.
//!
//! Built-in endpoints:
//!
//! - `GET /health`: liveness probe
//! - `GET /ready`: readiness probe; flips unavailable during shutdown
//!
//! # Request flow
//!
//! 1. Contract `resolve(method, path)`; a miss is a 404 envelope.
//! 2. Identity resolution per the endpoint's auth requirement: public
//!    endpoints skip the gate, failures are 401, role mismatches 403.
//! 3. Body collection, bounded by size and deadline.
//! 4. Dispatch through the pipeline, bounded by the same deadline; a
//!    timeout is a 504 and is never retried here.
//! 5. The [`DispatchResult`](accord_pipeline::DispatchResult) renders as
//!    the response, with per-request metrics and a structured log line.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod health;
pub mod server;
pub mod shutdown;

pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use server::{HttpResponse, ResponseBody, Server, ServerBuilder};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
