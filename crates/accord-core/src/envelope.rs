//! Wire envelope types.
//!
//! Every boundary response conforms to exactly one of two shapes:
//!
//! - Success: `{"data": <T>}`, optionally with a `pagination` object for
//!   collection responses.
//! - Error: `{"error": "<message>"}`, optionally with a `details` object.
//!
//! No other shape is ever emitted, and `data` and `error` never appear
//! together. Handlers and services never build these by hand; the dispatch
//! layer renders them from typed results.
//!
//! # Example
//!
//! ```
//! use accord_core::envelope::{DataEnvelope, Pagination};
//!
//! let body = DataEnvelope::new(serde_json::json!({"id": "n1"}));
//! let json = serde_json::to_string(&body).unwrap();
//! assert_eq!(json, r#"{"data":{"id":"n1"}}"#);
//!
//! let page = Pagination::new(1, 20, 45);
//! assert_eq!(page.total_pages, 3);
//! ```

use serde::{Deserialize, Serialize};

/// Success envelope carrying a single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    /// The response payload.
    pub data: T,
}

impl<T> DataEnvelope<T> {
    /// Wraps a value in the success envelope.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Success envelope carrying a collection plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedEnvelope<T> {
    /// The page of items.
    pub data: Vec<T>,
    /// Pagination metadata for the collection.
    pub pagination: Pagination,
}

impl<T> PagedEnvelope<T> {
    /// Wraps a page of items in the success envelope.
    #[must_use]
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self { data, pagination }
    }
}

/// Pagination metadata attached to collection responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    /// Maximum items per page.
    pub limit: u64,
    /// Total items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl Pagination {
    /// Builds pagination metadata, deriving `total_pages` from the totals.
    ///
    /// A `limit` of zero yields zero pages rather than dividing by zero.
    #[must_use]
    pub const fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Error envelope for failed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable error message.
    pub error: String,
    /// Optional object describing the violated field(s) or resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Creates an error envelope with a message only.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Creates an error envelope with a message and a details object.
    #[must_use]
    pub fn with_details(error: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            error: error.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_envelope_shape() {
        let envelope = DataEnvelope::new(serde_json::json!({"id": "n1", "name": "first"}));
        let json = serde_json::to_value(&envelope).expect("serialization should work");
        assert_eq!(
            json,
            serde_json::json!({"data": {"id": "n1", "name": "first"}})
        );
    }

    #[test]
    fn test_paged_envelope_shape() {
        let envelope = PagedEnvelope::new(
            vec![serde_json::json!({"id": "n1"})],
            Pagination::new(2, 10, 31),
        );
        let json = serde_json::to_value(&envelope).expect("serialization should work");
        assert_eq!(
            json,
            serde_json::json!({
                "data": [{"id": "n1"}],
                "pagination": {"page": 2, "limit": 10, "total": 31, "totalPages": 4}
            })
        );
    }

    #[test]
    fn test_error_envelope_without_details() {
        let envelope = ErrorEnvelope::new("Forbidden");
        let json = serde_json::to_value(&envelope).expect("serialization should work");
        assert_eq!(json, serde_json::json!({"error": "Forbidden"}));
    }

    #[test]
    fn test_error_envelope_with_details() {
        let envelope =
            ErrorEnvelope::with_details("Validation failed", serde_json::json!({"field": "name"}));
        let json = serde_json::to_value(&envelope).expect("serialization should work");
        assert_eq!(
            json,
            serde_json::json!({"error": "Validation failed", "details": {"field": "name"}})
        );
    }

    #[test]
    fn test_envelopes_never_mix_data_and_error() {
        let success = serde_json::to_value(DataEnvelope::new(1)).expect("serialize");
        let failure = serde_json::to_value(ErrorEnvelope::new("boom")).expect("serialize");

        assert!(success.get("data").is_some());
        assert!(success.get("error").is_none());
        assert!(failure.get("error").is_some());
        assert!(failure.get("data").is_none());
    }

    // ==== Pagination arithmetic ====

    #[test]
    fn test_pagination_exact_division() {
        let page = Pagination::new(1, 10, 30);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_pagination_rounds_up() {
        let page = Pagination::new(1, 10, 31);
        assert_eq!(page.total_pages, 4);
    }

    #[test]
    fn test_pagination_empty_collection() {
        let page = Pagination::new(1, 10, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_pagination_zero_limit_does_not_divide() {
        let page = Pagination::new(1, 0, 10);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_pagination_camel_case_key() {
        let json = serde_json::to_string(&Pagination::new(1, 5, 7)).expect("serialize");
        assert!(json.contains("\"totalPages\":2"));
        assert!(!json.contains("total_pages"));
    }
}
