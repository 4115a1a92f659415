//! Error types for Accord.
//!
//! This module provides the [`AccordError`] type, which is the standard error
//! type used throughout the Accord toolkit. Every boundary-facing failure in
//! the system is one of its variants; components raise them, the transport
//! edge translates them into the error envelope.
//!
//! # Status mapping
//!
//! | Variant | HTTP status |
//! |---|---|
//! | `Validation` | 400 |
//! | `Authentication` | 401 |
//! | `Authorization` | 403 |
//! | `NotFound` | 404 |
//! | `Conflict` | 409 |
//! | `Contract` | 500 |
//! | `Migration` | 500 |
//! | `Timeout` | 504 |
//! | `Internal` | 500 |
//!
//! `Contract`, `Migration`, `Timeout`, and `Internal` never expose their
//! message to callers; the envelope carries a generic message and the full
//! detail is logged server-side.

use crate::envelope::ErrorEnvelope;
use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`AccordError`].
pub type AccordResult<T> = Result<T, AccordError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request validation errors (missing fields, schema mismatch).
    Validation,
    /// Authentication errors (invalid/missing credentials).
    Authentication,
    /// Authorization errors (permission denied).
    Authorization,
    /// Resource not found.
    NotFound,
    /// Conflict (e.g., concurrent modification).
    Conflict,
    /// Contract integrity failures (undefined, colliding, or circular schemas).
    Contract,
    /// Migration apply/revert failures.
    Migration,
    /// Request timeout.
    Timeout,
    /// Internal errors.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Contract | Self::Migration | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Returns `true` when this category's message is safe to show callers.
    ///
    /// Categories that map to 5xx responses carry internal detail and are
    /// replaced by a generic message at the envelope boundary.
    #[must_use]
    pub const fn is_client_safe(&self) -> bool {
        matches!(
            self,
            Self::Validation
                | Self::Authentication
                | Self::Authorization
                | Self::NotFound
                | Self::Conflict
        )
    }
}

/// Standard error type for Accord.
///
/// `AccordError` provides structured errors with:
/// - Error categorization
/// - HTTP status code mapping
/// - Serializable error envelope for responses
/// - Error chaining support
///
/// # Example
///
/// ```
/// use accord_core::{AccordError, ErrorCategory};
///
/// fn check_name(name: &str) -> Result<(), AccordError> {
///     if name.is_empty() {
///         return Err(AccordError::validation("name must not be empty"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum AccordError {
    /// Structural validation failed at the handler boundary.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// No resolvable identity for the request.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Resolved identity lacks rights over the target resource.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
        /// The operation that was denied.
        operation_id: Option<String>,
    },

    /// Referenced entity does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The type of resource that was not found.
        resource: Option<String>,
        /// The identifier of the resource.
        resource_id: Option<String>,
    },

    /// Concurrent modification detected (stale revision).
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// Binding generation cannot proceed.
    #[error("Contract error: {message}")]
    Contract {
        /// Description of the integrity failure.
        message: String,
    },

    /// A migration apply/revert step failed partway.
    #[error("Migration failure: {message}")]
    Migration {
        /// Description of the failure, including the migration key.
        message: String,
    },

    /// A storage or outbound call exceeded its bounded wait.
    #[error("Timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// Unclassified internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AccordError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error with the stock `Forbidden` message.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::Authorization {
            message: "Forbidden".to_string(),
            operation_id: None,
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            operation_id: None,
        }
    }

    /// Creates an authorization error with operation context.
    #[must_use]
    pub fn authorization_for_operation(
        message: impl Into<String>,
        operation_id: impl Into<String>,
    ) -> Self {
        Self::Authorization {
            message: message.into(),
            operation_id: Some(operation_id.into()),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            resource: None,
            resource_id: None,
        }
    }

    /// Creates a not found error with resource context.
    #[must_use]
    pub fn not_found_resource(
        resource: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource = resource.into();
        let resource_id = resource_id.into();
        Self::NotFound {
            message: format!("{resource} with ID '{resource_id}' not found"),
            resource: Some(resource),
            resource_id: Some(resource_id),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a contract integrity error.
    #[must_use]
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// Creates a migration failure error.
    #[must_use]
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Contract { .. } => ErrorCategory::Contract,
            Self::Migration { .. } => ErrorCategory::Migration,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the message as shown to callers.
    ///
    /// Client-safe categories expose their own message; everything else is
    /// replaced by a generic message so internal detail never leaks through
    /// the response boundary.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Authentication { message }
            | Self::Authorization { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message } => message.clone(),
            Self::Timeout { .. } => "Request timed out".to_string(),
            Self::Contract { .. } | Self::Migration { .. } | Self::Internal { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    /// Converts this error to the wire-level error envelope.
    ///
    /// The envelope is always exactly `{"error": <message>}` with an optional
    /// `details` object describing the violated field(s) or resource.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self.error_details() {
            Some(details) => ErrorEnvelope::with_details(self.client_message(), details),
            None => ErrorEnvelope::new(self.client_message()),
        }
    }

    /// Returns the `details` object for the envelope, when one applies.
    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } if !errors.is_empty() => Some(errors.to_details()),
            Self::NotFound {
                resource: Some(resource),
                resource_id: Some(id),
                ..
            } => Some(serde_json::json!({
                "resource": resource,
                "id": id
            })),
            Self::Authorization {
                operation_id: Some(op),
                ..
            } => Some(serde_json::json!({
                "operation": op
            })),
            _ => None,
        }
    }
}

/// Field-specific validation errors, in the order they were found.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
#[error("Field validation errors")]
pub struct FieldErrors {
    /// Map of field path to list of error messages.
    pub fields: IndexMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the first violated field, if any.
    #[must_use]
    pub fn first_field(&self) -> Option<&str> {
        self.fields.keys().next().map(String::as_str)
    }

    /// Renders the envelope `details` object.
    ///
    /// The shape is `{"field": <first violated field>, "fields": {...}}` so
    /// single-field failures stay trivially inspectable while multi-field
    /// failures remain fully described.
    #[must_use]
    pub fn to_details(&self) -> serde_json::Value {
        let mut details = serde_json::Map::new();
        if let Some(first) = self.first_field() {
            details.insert(
                "field".to_string(),
                serde_json::Value::String(first.to_string()),
            );
        }
        if let Ok(fields) = serde_json::to_value(&self.fields) {
            details.insert("fields".to_string(), fields);
        }
        serde_json::Value::Object(details)
    }
}
