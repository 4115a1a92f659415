//! JWT payload decoding.
//!
//! [`ClaimsDecoder`] reads the claims segment of a JWT without checking
//! its signature. It exists for deployments where a trusted upstream
//! terminator (gateway, sidecar, load balancer) has already verified the
//! token and this process only needs the claims. Expiry is still checked
//! here, since a terminator may cache.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde_json::Value;

use crate::verifier::{TokenPayload, TokenVerifier, VerifyError, VerifyFuture};

/// Claim names lifted out of the payload rather than passed through.
const SUBJECT_CLAIM: &str = "sub";
const ROLES_CLAIM: &str = "roles";
const EXPIRY_CLAIM: &str = "exp";

/// A [`TokenVerifier`] that decodes JWT claims and trusts an upstream
/// signature check.
#[derive(Debug, Clone, Default)]
pub struct ClaimsDecoder {
    /// Seconds of clock skew tolerated when checking expiry.
    leeway_secs: i64,
}

impl ClaimsDecoder {
    /// Creates a decoder with no expiry leeway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clock-skew leeway applied to the `exp` claim.
    #[must_use]
    pub fn with_leeway_secs(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    fn decode(&self, token: &str) -> Result<TokenPayload, VerifyError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(claims), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(VerifyError::Malformed("expected three dot-separated segments"));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| VerifyError::Malformed("claims segment is not base64url"))?;
        let claims: Value = serde_json::from_slice(&bytes)
            .map_err(|_| VerifyError::Malformed("claims segment is not JSON"))?;
        let Value::Object(mut claims) = claims else {
            return Err(VerifyError::Malformed("claims segment is not an object"));
        };

        if let Some(exp) = claims.get(EXPIRY_CLAIM).and_then(Value::as_i64) {
            if exp + self.leeway_secs < Utc::now().timestamp() {
                return Err(VerifyError::Expired);
            }
        }

        let Some(subject) = claims.get(SUBJECT_CLAIM).and_then(Value::as_str) else {
            return Err(VerifyError::Malformed("missing `sub` claim"));
        };
        let subject = subject.to_string();

        let roles = claims
            .get(ROLES_CLAIM)
            .and_then(Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(|r| r.as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default();

        claims.remove(SUBJECT_CLAIM);
        claims.remove(ROLES_CLAIM);
        Ok(TokenPayload {
            subject,
            roles,
            extra: claims,
        })
    }
}

impl TokenVerifier for ClaimsDecoder {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        let result = self.decode(token);
        Box::pin(async move { result })
    }
}
