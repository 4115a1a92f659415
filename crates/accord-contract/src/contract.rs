//! The contract: named schemas plus endpoint definitions.
//!
//! A [`Contract`] is only ever constructed through [`Contract::from_document`]
//! or [`Contract::builder`], both of which verify integrity: every schema
//! reference resolves, no schema is circular, no operation ID repeats, and
//! every declared pattern compiles. A constructed contract is therefore safe
//! to generate bindings from and to route against.
//!
//! # Example
//!
//! ```
//! use accord_contract::{Contract, Endpoint, Schema};
//! use http::Method;
//!
//! let contract = Contract::builder("notes")
//!     .version("1.0.0")
//!     .schema("Note", Schema::object(vec![
//!         ("id", Schema::string().required()),
//!         ("name", Schema::string().required()),
//!     ]))
//!     .endpoint(
//!         Endpoint::builder("getNote")
//!             .method(Method::GET)
//!             .path("/notes/{noteId}")
//!             .response(200, Some("Note"))
//!             .build(),
//!     )
//!     .build()
//!     .expect("contract should verify");
//!
//! let resolved = contract.resolve(&Method::GET, "/notes/n1").unwrap();
//! assert_eq!(resolved.endpoint.operation_id(), "getNote");
//! assert_eq!(resolved.path_params["noteId"], "n1");
//! ```

use crate::error::ContractError;
use crate::schema::{Schema, SchemaTable, ValidationError};
use http::Method;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The raw serde form of a contract document.
///
/// This is what contract files contain; [`Contract::from_document`] turns it
/// into a verified [`Contract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    /// The service this contract describes.
    pub service: String,
    /// The contract version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Named schemas, in declaration order.
    #[serde(default)]
    pub schemas: SchemaTable,
    /// Endpoint definitions.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

/// A verified API contract.
///
/// Owned and versioned by maintainers; hand-edited, never generated. Every
/// other component reads it: the generator derives bindings from it, the
/// server routes against it, handlers validate against it.
#[derive(Debug, Clone, Serialize)]
pub struct Contract {
    service: String,
    version: String,
    schemas: SchemaTable,
    endpoints: Vec<Endpoint>,
    #[serde(skip)]
    endpoint_index: HashMap<String, usize>,
}

impl Contract {
    /// Creates a new contract builder.
    #[must_use]
    pub fn builder(service: impl Into<String>) -> ContractBuilder {
        ContractBuilder::new(service)
    }

    /// Builds a verified contract from a raw document.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] when a schema reference is undefined, a
    /// schema is circular, an operation ID repeats, or a pattern does not
    /// compile.
    pub fn from_document(document: ContractDocument) -> Result<Self, ContractError> {
        let mut contract = Self {
            service: document.service,
            version: document.version,
            schemas: document.schemas,
            endpoints: document.endpoints,
            endpoint_index: HashMap::new(),
        };
        contract.verify()?;
        contract.rebuild_index();
        Ok(contract)
    }

    /// Returns the raw document form, suitable for serialization.
    #[must_use]
    pub fn to_document(&self) -> ContractDocument {
        ContractDocument {
            service: self.service.clone(),
            version: self.version.clone(),
            schemas: self.schemas.clone(),
            endpoints: self.endpoints.clone(),
        }
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the contract version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the named schema table.
    #[must_use]
    pub fn schemas(&self) -> &SchemaTable {
        &self.schemas
    }

    /// Looks up a named schema.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Returns all endpoints defined in this contract.
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Looks up an endpoint by its operation ID.
    #[must_use]
    pub fn endpoint(&self, operation_id: &str) -> Option<&Endpoint> {
        self.endpoint_index
            .get(operation_id)
            .map(|&idx| &self.endpoints[idx])
    }

    /// Finds the endpoint matching an HTTP method and request path.
    ///
    /// Path parameters declared as `{param}` segments are extracted into the
    /// resolution.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedEndpoint<'_>> {
        for endpoint in &self.endpoints {
            if endpoint.method() == method {
                if let Some(path_params) = endpoint.match_path(path) {
                    return Some(ResolvedEndpoint {
                        endpoint,
                        path_params,
                    });
                }
            }
        }
        None
    }

    /// Validates a JSON value against a named schema.
    ///
    /// Returns every violation found, in document order.
    pub fn validate_named(
        &self,
        schema_name: &str,
        value: &serde_json::Value,
    ) -> Result<(), Vec<ValidationError>> {
        match self.schemas.get(schema_name) {
            Some(schema) => schema.validate(value, &self.schemas),
            None => Err(vec![ValidationError::new(
                "$",
                format!("unknown schema reference '{schema_name}'"),
            )]),
        }
    }

    /// Re-checks the contract's integrity invariants.
    ///
    /// Construction already runs this; it is exposed for tooling that wants
    /// to check a document without keeping the contract.
    pub fn verify(&self) -> Result<(), ContractError> {
        self.check_duplicate_operations()?;
        self.check_references()?;
        self.check_cycles()?;
        self.check_patterns()?;
        Ok(())
    }

    fn check_duplicate_operations(&self) -> Result<(), ContractError> {
        let mut seen = HashMap::new();
        for endpoint in &self.endpoints {
            if seen.insert(endpoint.operation_id(), ()).is_some() {
                return Err(ContractError::DuplicateOperation {
                    operation_id: endpoint.operation_id().to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_references(&self) -> Result<(), ContractError> {
        for (name, schema) in &self.schemas {
            let mut refs = Vec::new();
            schema.collect_references(&mut refs);
            for reference in refs {
                if !self.schemas.contains_key(reference) {
                    return Err(ContractError::UndefinedSchemaRef {
                        name: reference.to_string(),
                        referenced_by: format!("schema '{name}'"),
                    });
                }
            }
        }

        for endpoint in &self.endpoints {
            for reference in endpoint
                .request_schema()
                .into_iter()
                .chain(endpoint.response().schema.as_deref())
            {
                if !self.schemas.contains_key(reference) {
                    return Err(ContractError::UndefinedSchemaRef {
                        name: reference.to_string(),
                        referenced_by: format!("operation '{}'", endpoint.operation_id()),
                    });
                }
            }
        }

        Ok(())
    }

    fn check_cycles(&self) -> Result<(), ContractError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Visit {
            White,
            Grey,
            Black,
        }

        fn dfs<'a>(
            name: &'a str,
            schemas: &'a SchemaTable,
            state: &mut HashMap<&'a str, Visit>,
            stack: &mut Vec<&'a str>,
        ) -> Result<(), ContractError> {
            state.insert(name, Visit::Grey);
            stack.push(name);

            let mut refs = Vec::new();
            if let Some(schema) = schemas.get(name) {
                schema.collect_references(&mut refs);
            }

            for reference in refs {
                match state.get(reference).copied() {
                    // Undefined references are reported by check_references.
                    None => {}
                    Some(Visit::White) => dfs(reference, schemas, state, stack)?,
                    Some(Visit::Grey) => {
                        let start = stack
                            .iter()
                            .position(|entry| *entry == reference)
                            .unwrap_or(0);
                        let mut cycle: Vec<&str> = stack[start..].to_vec();
                        cycle.push(reference);
                        return Err(ContractError::CircularSchema {
                            name: reference.to_string(),
                            cycle: cycle.join(" -> "),
                        });
                    }
                    Some(Visit::Black) => {}
                }
            }

            stack.pop();
            state.insert(name, Visit::Black);
            Ok(())
        }

        let mut state: HashMap<&str, Visit> = self
            .schemas
            .keys()
            .map(|name| (name.as_str(), Visit::White))
            .collect();
        let mut stack = Vec::new();

        let names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        for name in names {
            if state.get(name) == Some(&Visit::White) {
                dfs(name, &self.schemas, &mut state, &mut stack)?;
            }
        }
        Ok(())
    }

    fn check_patterns(&self) -> Result<(), ContractError> {
        for (name, schema) in &self.schemas {
            let mut patterns = Vec::new();
            schema.collect_patterns(&mut patterns);
            for pattern in patterns {
                if let Err(err) = Regex::new(pattern) {
                    return Err(ContractError::invalid(format!(
                        "schema '{name}' declares invalid pattern '{pattern}': {err}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.endpoint_index.clear();
        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            self.endpoint_index
                .insert(endpoint.operation_id().to_string(), idx);
        }
    }
}

/// Builder for creating [`Contract`] instances.
#[derive(Debug)]
pub struct ContractBuilder {
    service: String,
    version: String,
    schemas: SchemaTable,
    endpoints: Vec<Endpoint>,
}

impl ContractBuilder {
    /// Creates a new contract builder.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: default_version(),
            schemas: SchemaTable::new(),
            endpoints: Vec::new(),
        }
    }

    /// Sets the contract version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds a named schema to the contract.
    #[must_use]
    pub fn schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.schemas.insert(name.into(), schema);
        self
    }

    /// Adds an endpoint to the contract.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Adds multiple endpoints to the contract.
    #[must_use]
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    /// Builds and verifies the contract.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] when an integrity invariant is violated.
    pub fn build(self) -> Result<Contract, ContractError> {
        Contract::from_document(ContractDocument {
            service: self.service,
            version: self.version,
            schemas: self.schemas,
            endpoints: self.endpoints,
        })
    }
}

/// How callers must authenticate for an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthRequirement {
    /// No identity required; the gate is skipped.
    Public,
    /// Any authenticated identity.
    #[default]
    Authenticated,
    /// An authenticated identity holding at least one of these roles.
    Roles {
        /// Accepted role names.
        roles: Vec<String>,
    },
}

/// The declared success response of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// HTTP status for the success case.
    pub status: u16,
    /// Named schema of the response payload, if the response has a body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl Default for ResponseSpec {
    fn default() -> Self {
        Self {
            status: 200,
            schema: None,
        }
    }
}

/// An endpoint defined in a contract.
///
/// Endpoints bind an operation ID to an HTTP method, a path pattern, schema
/// references for request and response bodies, and an auth requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Unique identifier for this operation (e.g., "getNote").
    operation_id: String,
    /// HTTP method for this operation.
    #[serde(with = "http_method_serde")]
    method: Method,
    /// Path pattern with parameter placeholders (e.g., "/notes/{noteId}").
    path: String,
    /// Named schema of the request body, if the operation accepts one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_schema: Option<String>,
    /// The declared success response.
    #[serde(default)]
    response: ResponseSpec,
    /// Error statuses this operation is declared to produce.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    error_statuses: Vec<u16>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Authentication requirement for this operation.
    #[serde(default)]
    auth: AuthRequirement,
}

impl Endpoint {
    /// Creates a new endpoint builder.
    #[must_use]
    pub fn builder(operation_id: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(operation_id)
    }

    /// Returns the operation ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path pattern.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request schema name if the operation accepts a body.
    #[must_use]
    pub fn request_schema(&self) -> Option<&str> {
        self.request_schema.as_deref()
    }

    /// Returns the declared success response.
    #[must_use]
    pub fn response(&self) -> &ResponseSpec {
        &self.response
    }

    /// Returns the declared error statuses.
    #[must_use]
    pub fn error_statuses(&self) -> &[u16] {
        &self.error_statuses
    }

    /// Returns the endpoint description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the authentication requirement.
    #[must_use]
    pub fn auth(&self) -> &AuthRequirement {
        &self.auth
    }

    /// Attempts to match a request path against this endpoint's path pattern.
    ///
    /// Returns the extracted path parameters if the path matches.
    #[must_use]
    pub fn match_path(&self, request_path: &str) -> Option<HashMap<String, String>> {
        let pattern_segments = parse_path(&self.path);
        let request_segments: Vec<&str> = request_path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        if request_segments.len() != pattern_segments.len() {
            return None;
        }

        let mut params = HashMap::new();

        for (pattern, actual) in pattern_segments.iter().zip(request_segments.iter()) {
            match pattern {
                PathSegment::Literal(lit) => {
                    if lit != actual {
                        return None;
                    }
                }
                PathSegment::Parameter(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }

        Some(params)
    }
}

/// Builder for creating [`Endpoint`] instances.
#[derive(Debug)]
pub struct EndpointBuilder {
    operation_id: String,
    method: Method,
    path: String,
    request_schema: Option<String>,
    response: ResponseSpec,
    error_statuses: Vec<u16>,
    description: Option<String>,
    auth: AuthRequirement,
}

impl EndpointBuilder {
    /// Creates a new endpoint builder.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            method: Method::GET,
            path: "/".to_string(),
            request_schema: None,
            response: ResponseSpec::default(),
            error_statuses: Vec::new(),
            description: None,
            auth: AuthRequirement::default(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the path pattern.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the request body schema by name.
    #[must_use]
    pub fn request_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.request_schema = Some(schema_name.into());
        self
    }

    /// Sets the success response status and optional body schema.
    #[must_use]
    pub fn response(mut self, status: u16, schema_name: Option<&str>) -> Self {
        self.response = ResponseSpec {
            status,
            schema: schema_name.map(ToString::to_string),
        };
        self
    }

    /// Declares an error status this operation can produce.
    #[must_use]
    pub fn error_status(mut self, status: u16) -> Self {
        self.error_statuses.push(status);
        self
    }

    /// Sets the endpoint description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the authentication requirement.
    #[must_use]
    pub fn auth(mut self, auth: AuthRequirement) -> Self {
        self.auth = auth;
        self
    }

    /// Marks this endpoint as public (no identity required).
    #[must_use]
    pub fn public(mut self) -> Self {
        self.auth = AuthRequirement::Public;
        self
    }

    /// Requires the caller to hold at least one of the given roles.
    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auth = AuthRequirement::Roles {
            roles: roles.into_iter().map(Into::into).collect(),
        };
        self
    }

    /// Builds the endpoint.
    #[must_use]
    pub fn build(self) -> Endpoint {
        Endpoint {
            operation_id: self.operation_id,
            method: self.method,
            path: self.path,
            request_schema: self.request_schema,
            response: self.response,
            error_statuses: self.error_statuses,
            description: self.description,
            auth: self.auth,
        }
    }
}

/// A successful endpoint resolution.
#[derive(Debug)]
pub struct ResolvedEndpoint<'a> {
    /// The matched endpoint.
    pub endpoint: &'a Endpoint,
    /// Path parameters extracted from the request path.
    pub path_params: HashMap<String, String>,
}

/// A path segment in an endpoint's path pattern.
#[derive(Debug, Clone)]
enum PathSegment {
    /// A literal path segment (e.g., "notes").
    Literal(String),
    /// A path parameter (e.g., "{noteId}").
    Parameter(String),
}

/// Parses a path pattern into segments.
fn parse_path(path: &str) -> Vec<PathSegment> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                PathSegment::Parameter(segment[1..segment.len() - 1].to_string())
            } else {
                PathSegment::Literal(segment.to_string())
            }
        })
        .collect()
}

/// Serde support for HTTP methods.
mod http_method_serde {
    use http::Method;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Method, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
