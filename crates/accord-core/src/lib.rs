//! # Accord Core
//!
//! Core types for the Accord contract-first toolkit.
//!
//! This crate provides the foundational types used throughout Accord:
//!
//! - [`RequestContext`] - Per-request context carrying identity and metadata
//! - [`RequestId`] - UUID v7 request identifier
//! - [`IdentityContext`] - Resolved caller identity and claims
//! - [`AccordError`] - Standard error taxonomy
//! - [`envelope`] - The fixed success/error wire envelope shapes

#![doc(html_root_url = "https://docs.rs/accord-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod envelope;
mod error;
mod identity;

pub use context::{RequestContext, RequestId};
pub use envelope::{DataEnvelope, ErrorEnvelope, PagedEnvelope, Pagination};
pub use error::{AccordError, AccordResult, ErrorCategory, FieldErrors};
pub use identity::{Claims, IdentityContext};
