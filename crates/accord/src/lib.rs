//! # Accord
//!
//! **Contract-first API bindings and schema migrations**
//!
//! Accord keeps three views of a service in lockstep: the hand-edited
//! API contract, the bindings generated from it, and the documents in
//! storage. The crates under this facade cover the full loop:
//!
//! - **Contracts** - typed schemas and endpoint declarations, verified
//!   at load time and diffable for review
//! - **Bindings** - deterministic code generation with manifest-based
//!   drift detection
//! - **Migrations** - declarative, reversible schema migrations with a
//!   ledger and advisory locking
//! - **Serving** - an HTTP server that routes, authenticates, and
//!   validates every request against the contract
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use accord::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("accord.toml")?
//!         .with_env_prefix("ACCORD")
//!         .load_unvalidated()?;
//!     let runtime = accord::bootstrap::prepare(config).await?;
//!
//!     let server = Server::builder()
//!         .config(runtime.config)
//!         .contract(runtime.contract)
//!         .identity_gate(gate)
//!         .registry(registry)
//!         .store_pool(runtime.pool)
//!         .build()?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → Resolve (contract) → Identity gate → Body limits
//!         → Validate (schema) → Handler → Map → Envelope
//! ```

#![doc(html_root_url = "https://docs.rs/accord/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;

// Re-export shared types
pub use accord_core as core;

// Re-export contract types
pub use accord_contract as contract;

// Re-export binding generation
pub use accord_codegen as codegen;

// Re-export document storage
pub use accord_store as store;

// Re-export schema migrations
pub use accord_migrate as migrate;

// Re-export identity verification
pub use accord_identity as identity;

// Re-export the request pipeline
pub use accord_pipeline as pipeline;

// Re-export configuration
pub use accord_config as config;

// Re-export logging and metrics
pub use accord_telemetry as telemetry;

// Re-export the HTTP server
pub use accord_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use accord::prelude::*;
/// ```
pub mod prelude {
    pub use accord_core::{
        AccordError, AccordResult, Claims, DataEnvelope, ErrorEnvelope, IdentityContext,
        PagedEnvelope, Pagination, RequestContext, RequestId,
    };

    // Re-export contract types
    pub use accord_contract::{
        AuthRequirement, Contract, Endpoint, Schema, ValidationError,
    };

    // Re-export binding generation
    pub use accord_codegen::{generate, BindingManifest, BindingSet};

    // Re-export storage types
    pub use accord_store::{
        Document, FileStore, MemoryStore, SharedStore, Store, StorePool,
    };

    // Re-export migration types
    pub use accord_migrate::{
        MigrationKey, MigrationPlan, MigrationRunner, RevertOutcome, RunOutcome,
    };

    // Re-export identity types
    pub use accord_identity::{IdentityGate, StaticTokenVerifier, TokenPayload, TokenVerifier};

    // Re-export pipeline types
    pub use accord_pipeline::{
        Chain, DispatchResult, Dispatcher, OperationRegistry, RawRequest, SchemaHandler, Service,
        ServiceOutput,
    };

    // Re-export configuration
    pub use accord_config::{AccordConfig, ConfigLoader};

    // Re-export telemetry initialization
    pub use accord_telemetry::{init_telemetry, LogConfig, MetricsConfig};

    // Re-export server types
    pub use accord_server::{Server, ServerBuilder, ShutdownSignal};
}
