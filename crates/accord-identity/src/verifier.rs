//! The token verification boundary.
//!
//! [`TokenVerifier`] is the seam between the gate and whatever actually
//! vouches for credentials. The gate never inspects tokens itself; it
//! hands the raw bearer string to the verifier and maps the resulting
//! payload into an identity context. Signature mechanics live behind this
//! trait, not in front of it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use accord_core::{Claims, IdentityContext};
use thiserror::Error;

/// A boxed future returned by [`TokenVerifier::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenPayload, VerifyError>> + Send + 'a>>;

/// Why a credential failed verification.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The credential's validity window has passed.
    #[error("credential expired")]
    Expired,

    /// The credential does not verify against known key material.
    #[error("credential signature rejected")]
    BadSignature,

    /// The credential could not be parsed at all.
    #[error("credential malformed: {0}")]
    Malformed(&'static str),

    /// Key material could not be obtained from the issuer.
    #[error("key material unavailable: {0}")]
    KeySource(String),
}

/// The claims a verifier extracted from a valid credential.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload {
    /// Stable subject identifier.
    pub subject: String,
    /// Role names granted to the subject.
    pub roles: Vec<String>,
    /// Remaining claims, passed through untouched.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenPayload {
    /// Creates a payload with roles and no extra claims.
    #[must_use]
    pub fn new<I, S>(subject: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            extra: serde_json::Map::new(),
        }
    }

    /// Converts the payload into a resolved identity.
    #[must_use]
    pub fn into_identity(self) -> IdentityContext {
        let claims = Claims {
            roles: self.roles,
            extra: self.extra,
        };
        IdentityContext::authenticated(self.subject, claims)
    }
}

/// Verifies bearer credentials.
///
/// Implementations must be side-effect free with respect to request state:
/// a verifier sees only the token, never the request.
pub trait TokenVerifier: Send + Sync + 'static {
    /// Verifies `token`, returning its payload on success.
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a>;
}

/// A fixture verifier backed by a literal token map.
///
/// For tests and local development: tokens are opaque strings looked up
/// verbatim, and anything absent from the map is rejected.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, TokenPayload>,
}

impl StaticTokenVerifier {
    /// Creates an empty verifier that rejects everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token and the payload it resolves to.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, payload: TokenPayload) -> Self {
        self.tokens.insert(token.into(), payload);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        let result = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(VerifyError::BadSignature);
        Box::pin(async move { result })
    }
}
