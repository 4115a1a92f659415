//! # Accord Contract
//!
//! The contract store for the Accord toolkit: document model, loading and
//! merging, integrity verification, endpoint resolution, structural value
//! validation, and diffing.
//!
//! The contract is the hand-edited source of truth. Bindings are derived
//! from it, requests are routed and validated against it, and it is never
//! generated from code.
//!
//! # Example
//!
//! ```
//! use accord_contract::{Contract, Endpoint, Schema};
//! use http::Method;
//!
//! let contract = Contract::builder("notes")
//!     .version("1.0.0")
//!     .schema("CreateNote", Schema::object(vec![
//!         ("name", Schema::string().required()),
//!     ]))
//!     .endpoint(
//!         Endpoint::builder("createNote")
//!             .method(Method::POST)
//!             .path("/notes")
//!             .request_schema("CreateNote")
//!             .response(201, None)
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let errors = contract
//!     .validate_named("CreateNote", &serde_json::json!({}))
//!     .unwrap_err();
//! assert_eq!(errors[0].field(), Some("name"));
//! ```

#![doc(html_root_url = "https://docs.rs/accord-contract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod contract;
pub mod diff;
mod error;
mod schema;
pub mod store;

pub use contract::{
    AuthRequirement, Contract, ContractBuilder, ContractDocument, Endpoint, EndpointBuilder,
    ResolvedEndpoint, ResponseSpec,
};
pub use diff::{diff, ContractDiff};
pub use error::ContractError;
pub use schema::{to_field_errors, Schema, SchemaTable, ValidationError};
