//! Deterministic Rust binding generation for Accord contracts.
//!
//! This crate turns a verified contract into Rust source for its schemas:
//! one serde-deriving struct per named object schema, type aliases for
//! scalar schemas, and lifted structs for inline objects. Generation is a
//! pure function of the contract, so regenerating from an unchanged
//! contract is byte-identical, and the output directory is replaced
//! wholesale on every write so stale types never linger.
//!
//! # Example
//!
//! ```
//! use accord_codegen::generate;
//! use accord_contract::{ContractBuilder, Schema};
//!
//! let contract = ContractBuilder::new("inventory")
//!     .version("1.0.0")
//!     .schema(
//!         "Thing",
//!         Schema::object(vec![
//!             ("id", Schema::string().required()),
//!             ("name", Schema::string().required()),
//!         ]),
//!     )
//!     .build()
//!     .expect("valid contract");
//!
//! let bindings = generate(&contract).expect("generation succeeds");
//! assert!(bindings.rust_source().contains("pub struct Thing"));
//! ```

#![doc(html_root_url = "https://docs.rs/accord-codegen/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod generator;
pub mod naming;

pub use binding::{BindingManifest, BindingSet, BINDINGS_FILE, MANIFEST_FILE};
pub use generator::generate;
