//! Identity resolution for Accord services.
//!
//! The [`IdentityGate`] turns a raw `Authorization` header into the
//! [`IdentityContext`](accord_core::IdentityContext) the rest of the
//! request pipeline reads. Verification itself sits behind the
//! [`TokenVerifier`] trait: [`StaticTokenVerifier`] for fixtures,
//! [`ClaimsDecoder`] for deployments where a trusted terminator already
//! checked signatures, and [`KeyMaterialClient`] for fetching issuer keys
//! when a signature-checking verifier is plugged in.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use accord_identity::{IdentityGate, StaticTokenVerifier, TokenPayload};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), accord_identity::IdentityError> {
//! let verifier = StaticTokenVerifier::new()
//!     .with_token("dev-token", TokenPayload::new("user-1", ["editor"]));
//! let gate = IdentityGate::new(Arc::new(verifier));
//!
//! let identity = gate.resolve(Some("Bearer dev-token")).await?;
//! assert!(identity.has_role("editor"));
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/accord-identity/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decoder;
mod error;
mod gate;
mod keys;
mod verifier;

pub use decoder::ClaimsDecoder;
pub use error::IdentityError;
pub use gate::IdentityGate;
pub use keys::{KeyMaterial, KeyMaterialClient, DEFAULT_FETCH_TIMEOUT};
pub use verifier::{StaticTokenVerifier, TokenPayload, TokenVerifier, VerifyError, VerifyFuture};
