//! Gate error types.

use accord_core::AccordError;
use thiserror::Error;

use crate::verifier::VerifyError;

/// Why the gate could not resolve an identity.
///
/// Every variant maps to a 401 at the boundary. The distinction exists for
/// logs and tests; clients only ever see "Authentication required".
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No `Authorization` header was presented.
    #[error("no credential presented")]
    MissingCredential,

    /// The header was present but not a bearer credential.
    #[error("malformed authorization header")]
    Malformed,

    /// The verifier rejected the credential.
    #[error("credential rejected: {0}")]
    Rejected(#[from] VerifyError),
}

impl From<IdentityError> for AccordError {
    fn from(_: IdentityError) -> Self {
        Self::authentication("Authentication required")
    }
}
