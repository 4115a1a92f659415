//! The identity gate.

use std::sync::Arc;

use accord_core::IdentityContext;

use crate::error::IdentityError;
use crate::verifier::TokenVerifier;

/// Header scheme prefix the gate accepts.
const BEARER_PREFIX: &str = "Bearer ";

/// Resolves an `Authorization` header into an [`IdentityContext`].
///
/// The gate runs exactly once per request, before the pipeline. It holds
/// no per-request state; cloning shares the underlying verifier.
#[derive(Clone)]
pub struct IdentityGate {
    verifier: Arc<dyn TokenVerifier>,
}

impl IdentityGate {
    /// Creates a gate over the given verifier.
    #[must_use]
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Resolves the caller identity from the raw `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingCredential`] when no header is
    /// present, [`IdentityError::Malformed`] when it is not a non-empty
    /// bearer credential, and [`IdentityError::Rejected`] when the
    /// verifier turns it down. All three surface as 401 at the boundary.
    pub async fn resolve(
        &self,
        authorization_header: Option<&str>,
    ) -> Result<IdentityContext, IdentityError> {
        let header = authorization_header.ok_or(IdentityError::MissingCredential)?;
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(IdentityError::Malformed)?
            .trim();
        if token.is_empty() {
            return Err(IdentityError::Malformed);
        }

        let payload = self.verifier.verify(token).await?;
        let identity = payload.into_identity();
        tracing::debug!(identity = %identity.log_id(), "resolved caller identity");
        Ok(identity)
    }
}

impl std::fmt::Debug for IdentityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityGate").finish_non_exhaustive()
    }
}
