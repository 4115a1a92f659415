//! Caller identity types.
//!
//! An [`IdentityContext`] is resolved exactly once per request, upstream of
//! the request pipeline, and attached read-only to the request context. It is
//! never persisted. Role checks over a resolved context are pure predicate
//! evaluations; they perform no I/O and cannot fail.
//!
//! # Example
//!
//! ```
//! use accord_core::{Claims, IdentityContext};
//!
//! let identity = IdentityContext::authenticated(
//!     "user-1",
//!     Claims::new(["editor"]),
//! );
//! assert!(identity.has_role("editor"));
//! assert!(!identity.has_role("admin"));
//! ```

use serde::{Deserialize, Serialize};

/// Role and auxiliary claims carried by an authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Role names granted to the caller.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Additional verifier-supplied claims, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Creates claims with the given roles and no extras.
    #[must_use]
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            extra: serde_json::Map::new(),
        }
    }

    /// Adds an auxiliary claim.
    #[must_use]
    pub fn with_claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns `true` when the caller holds the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` when the caller holds at least one of the given roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

/// The caller identity resolved for a single request.
///
/// Produced by the identity gate before the pipeline runs; immutable
/// afterwards. Endpoints that allow unauthenticated access receive
/// [`IdentityContext::Anonymous`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdentityContext {
    /// No credential was presented (public endpoints only).
    Anonymous,
    /// A verified caller.
    Authenticated {
        /// Stable subject identifier from the credential.
        subject: String,
        /// Claims extracted from the credential.
        claims: Claims,
    },
}

impl IdentityContext {
    /// Creates an anonymous identity.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates an authenticated identity.
    #[must_use]
    pub fn authenticated(subject: impl Into<String>, claims: Claims) -> Self {
        Self::Authenticated {
            subject: subject.into(),
            claims,
        }
    }

    /// Returns `true` for anonymous callers.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns the subject identifier, if authenticated.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { subject, .. } => Some(subject),
        }
    }

    /// Returns the resolved claims, if authenticated.
    #[must_use]
    pub const fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { claims, .. } => Some(claims),
        }
    }

    /// Returns `true` when the caller holds the given role.
    ///
    /// Anonymous callers hold no roles.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.claims().is_some_and(|claims| claims.has_role(role))
    }

    /// Returns `true` when the caller holds at least one of the given roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.claims()
            .is_some_and(|claims| claims.has_any_role(roles))
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// This never returns sensitive information like tokens.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::Anonymous => "anonymous".to_string(),
            Self::Authenticated { subject, .. } => format!("subject:{subject}"),
        }
    }
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::Anonymous
    }
}
