//! The transport-shaped request handed to handlers.

use std::collections::HashMap;

use serde_json::Value;

/// Everything a handler may look at: resolved path parameters, query
/// parameters, and the parsed JSON body, if one was sent.
///
/// The raw request carries no identity and no operation id; those travel
/// in the request context, resolved before the pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    path_params: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Option<Value>,
}

impl RawRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resolved path parameters.
    #[must_use]
    pub fn with_path_params(mut self, params: HashMap<String, String>) -> Self {
        self.path_params = params;
        self
    }

    /// Adds one path parameter.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Adds one query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the parsed JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Returns a query parameter by name.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Returns the parsed JSON body, if one was sent.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let raw = RawRequest::new()
            .with_path_param("id", "n1")
            .with_query("page", "2")
            .with_body(json!({"name": "first"}));

        assert_eq!(raw.path_param("id"), Some("n1"));
        assert_eq!(raw.path_param("missing"), None);
        assert_eq!(raw.query("page"), Some("2"));
        assert_eq!(raw.body().unwrap()["name"], "first");
    }

    #[test]
    fn test_empty_request_has_no_body() {
        assert!(RawRequest::new().body().is_none());
    }
}
