//! Contract schema types and structural validation.
//!
//! Schemas are structurally named: the contract holds a table of named
//! schemas, and both endpoints and other schemas refer to them by name via
//! [`Schema::Reference`]. De-duplication is by name, never by shape.
//!
//! Validation is structural only: required fields present, values correctly
//! typed, declared constraints honored. All violations are collected rather
//! than stopping at the first, so a single response can describe every
//! violated field.
//!
//! # Example
//!
//! ```
//! use accord_contract::Schema;
//!
//! let schema = Schema::object(vec![
//!     ("id", Schema::string().required()),
//!     ("name", Schema::string().required().min_length(1)),
//!     ("size", Schema::integer().minimum_int(0)),
//! ]);
//!
//! let valid = serde_json::json!({"id": "n1", "name": "first", "size": 3});
//! assert!(schema.validate(&valid, &Default::default()).is_ok());
//!
//! let invalid = serde_json::json!({"id": "n1"});
//! let errors = schema.validate(&invalid, &Default::default()).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].field(), Some("name"));
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Table of named schemas, as held by a contract.
pub type SchemaTable = IndexMap<String, Schema>;

/// A JSON schema as declared in a contract document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// String type.
    String {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
        /// Minimum length.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        /// Maximum length.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        /// Regex pattern the value must match.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    /// Integer type.
    Integer {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
        /// Minimum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        /// Maximum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    /// Number (float) type.
    Number {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
        /// Minimum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Maximum value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// Boolean type.
    Boolean {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
    },
    /// Array type.
    Array {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
        /// Schema for array items.
        items: Box<Schema>,
        /// Minimum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// Object type with declaration-ordered properties.
    Object {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
        /// Properties and their schemas, in declaration order.
        properties: IndexMap<String, Schema>,
        /// Names of properties that must be present.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required_properties: Vec<String>,
    },
    /// Reference to a named schema in the contract's table.
    Reference {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
        /// The referenced schema name.
        name: String,
    },
    /// Any type (accepts anything).
    Any {
        /// Whether this field is required.
        #[serde(default)]
        required: bool,
    },
    /// Null type.
    Null,
}

impl Schema {
    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean { required: false }
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            required: false,
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from a list of property definitions.
    ///
    /// Properties keep their declaration order; properties whose schema is
    /// marked required become required properties of the object.
    #[must_use]
    pub fn object(properties: Vec<(&str, Schema)>) -> Self {
        let required_properties: Vec<String> = properties
            .iter()
            .filter(|(_, schema)| schema.is_required())
            .map(|(name, _)| (*name).to_string())
            .collect();

        let props: IndexMap<String, Schema> = properties
            .into_iter()
            .map(|(name, schema)| (name.to_string(), schema))
            .collect();

        Self::Object {
            required: false,
            properties: props,
            required_properties,
        }
    }

    /// Creates a reference to a named schema.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference {
            required: false,
            name: name.into(),
        }
    }

    /// Creates an "any" schema that accepts any value.
    #[must_use]
    pub fn any() -> Self {
        Self::Any { required: false }
    }

    /// Creates a null schema.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Marks this schema as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        if let Some(flag) = self.required_flag_mut() {
            *flag = true;
        }
        self
    }

    /// Returns whether this schema is marked as required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        match self {
            Self::String { required, .. }
            | Self::Integer { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required, .. }
            | Self::Array { required, .. }
            | Self::Object { required, .. }
            | Self::Reference { required, .. }
            | Self::Any { required, .. } => *required,
            Self::Null => false,
        }
    }

    fn required_flag_mut(&mut self) -> Option<&mut bool> {
        match self {
            Self::String { required, .. }
            | Self::Integer { required, .. }
            | Self::Number { required, .. }
            | Self::Boolean { required, .. }
            | Self::Array { required, .. }
            | Self::Object { required, .. }
            | Self::Reference { required, .. }
            | Self::Any { required, .. } => Some(required),
            Self::Null => None,
        }
    }

    /// Sets the minimum length for string schemas.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Self::String { min_length, .. } = &mut self {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length for string schemas.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Self::String { max_length, .. } = &mut self {
            *max_length = Some(len);
        }
        self
    }

    /// Sets the regex pattern for string schemas.
    ///
    /// Pattern validity is checked when the contract is verified, not here.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        if let Self::String { pattern: p, .. } = &mut self {
            *p = Some(pattern.into());
        }
        self
    }

    /// Sets the minimum value for integer schemas.
    #[must_use]
    pub fn minimum_int(mut self, min: i64) -> Self {
        if let Self::Integer { minimum, .. } = &mut self {
            *minimum = Some(min);
        }
        self
    }

    /// Sets the maximum value for integer schemas.
    #[must_use]
    pub fn maximum_int(mut self, max: i64) -> Self {
        if let Self::Integer { maximum, .. } = &mut self {
            *maximum = Some(max);
        }
        self
    }

    /// Sets the minimum items for array schemas.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Self::Array { min_items, .. } = &mut self {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum items for array schemas.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Self::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    /// Validates a JSON value against this schema, resolving references
    /// through the given table.
    ///
    /// Returns every violation found, in document order.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_contract::Schema;
    ///
    /// let schema = Schema::string().min_length(1).required();
    /// assert!(schema.validate(&serde_json::json!("hello"), &Default::default()).is_ok());
    /// assert!(schema.validate(&serde_json::json!(""), &Default::default()).is_err());
    /// ```
    pub fn validate(
        &self,
        value: &serde_json::Value,
        schemas: &SchemaTable,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.validate_into(value, "$", schemas, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_into(
        &self,
        value: &serde_json::Value,
        path: &str,
        schemas: &SchemaTable,
        errors: &mut Vec<ValidationError>,
    ) {
        if value.is_null() {
            if self.is_required() {
                errors.push(ValidationError::new(path, "required field is null"));
            }
            return;
        }

        match self {
            Self::String {
                min_length,
                max_length,
                pattern,
                ..
            } => {
                let Some(s) = value.as_str() else {
                    errors.push(ValidationError::new(
                        path,
                        format!("expected string, got {}", value_type_name(value)),
                    ));
                    return;
                };

                if let Some(min) = min_length {
                    if s.len() < *min {
                        errors.push(ValidationError::new(
                            path,
                            format!("string length {} is less than minimum {}", s.len(), min),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if s.len() > *max {
                        errors.push(ValidationError::new(
                            path,
                            format!("string length {} is greater than maximum {}", s.len(), max),
                        ));
                    }
                }
                if let Some(p) = pattern {
                    if let Ok(re) = Regex::new(p) {
                        if !re.is_match(s) {
                            errors.push(ValidationError::new(
                                path,
                                format!("value does not match pattern '{p}'"),
                            ));
                        }
                    }
                }
            }

            Self::Integer {
                minimum, maximum, ..
            } => {
                let Some(n) = value.as_i64() else {
                    errors.push(ValidationError::new(
                        path,
                        format!("expected integer, got {}", value_type_name(value)),
                    ));
                    return;
                };

                if let Some(min) = minimum {
                    if n < *min {
                        errors.push(ValidationError::new(
                            path,
                            format!("value {n} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        errors.push(ValidationError::new(
                            path,
                            format!("value {n} is greater than maximum {max}"),
                        ));
                    }
                }
            }

            Self::Number {
                minimum, maximum, ..
            } => {
                let Some(n) = value.as_f64() else {
                    errors.push(ValidationError::new(
                        path,
                        format!("expected number, got {}", value_type_name(value)),
                    ));
                    return;
                };

                if let Some(min) = minimum {
                    if n < *min {
                        errors.push(ValidationError::new(
                            path,
                            format!("value {n} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        errors.push(ValidationError::new(
                            path,
                            format!("value {n} is greater than maximum {max}"),
                        ));
                    }
                }
            }

            Self::Boolean { .. } => {
                if !value.is_boolean() {
                    errors.push(ValidationError::new(
                        path,
                        format!("expected boolean, got {}", value_type_name(value)),
                    ));
                }
            }

            Self::Array {
                items,
                min_items,
                max_items,
                ..
            } => {
                let Some(arr) = value.as_array() else {
                    errors.push(ValidationError::new(
                        path,
                        format!("expected array, got {}", value_type_name(value)),
                    ));
                    return;
                };

                if let Some(min) = min_items {
                    if arr.len() < *min {
                        errors.push(ValidationError::new(
                            path,
                            format!("array length {} is less than minimum {}", arr.len(), min),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if arr.len() > *max {
                        errors.push(ValidationError::new(
                            path,
                            format!("array length {} is greater than maximum {}", arr.len(), max),
                        ));
                    }
                }

                for (idx, item) in arr.iter().enumerate() {
                    let item_path = format!("{path}[{idx}]");
                    items.validate_into(item, &item_path, schemas, errors);
                }
            }

            Self::Object {
                properties,
                required_properties,
                ..
            } => {
                let Some(obj) = value.as_object() else {
                    errors.push(ValidationError::new(
                        path,
                        format!("expected object, got {}", value_type_name(value)),
                    ));
                    return;
                };

                for required in required_properties {
                    if !obj.contains_key(required) {
                        errors.push(ValidationError::new(
                            format!("{path}.{required}"),
                            format!("missing required property '{required}'"),
                        ));
                    }
                }

                for (key, prop_schema) in properties {
                    if let Some(prop_value) = obj.get(key) {
                        let prop_path = format!("{path}.{key}");
                        prop_schema.validate_into(prop_value, &prop_path, schemas, errors);
                    }
                }
            }

            Self::Reference { name, .. } => match schemas.get(name) {
                Some(target) => target.validate_into(value, path, schemas, errors),
                None => {
                    errors.push(ValidationError::new(
                        path,
                        format!("unknown schema reference '{name}'"),
                    ));
                }
            },

            Self::Any { .. } => {}

            Self::Null => {
                errors.push(ValidationError::new(
                    path,
                    format!("expected null, got {}", value_type_name(value)),
                ));
            }
        }
    }

    /// Collects the names of all schemas referenced anywhere in this schema.
    pub(crate) fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Reference { name, .. } => out.push(name),
            Self::Array { items, .. } => items.collect_references(out),
            Self::Object { properties, .. } => {
                for schema in properties.values() {
                    schema.collect_references(out);
                }
            }
            _ => {}
        }
    }

    /// Collects every string pattern declared anywhere in this schema.
    pub(crate) fn collect_patterns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::String {
                pattern: Some(p), ..
            } => out.push(p),
            Self::Array { items, .. } => items.collect_patterns(out),
            Self::Object { properties, .. } => {
                for schema in properties.values() {
                    schema.collect_patterns(out);
                }
            }
            _ => {}
        }
    }
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A structural validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The JSON path where the error occurred, rooted at `$`.
    pub path: String,
    /// The error message.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error at a path.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the top-level field name the error concerns, if any.
    ///
    /// `$.name` and `$.name[2].id` both report `name`; a root-level error
    /// (`$`) reports `None`.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        let rest = self.path.strip_prefix("$.")?;
        let end = rest
            .find(['.', '['])
            .unwrap_or(rest.len());
        if end == 0 {
            None
        } else {
            Some(&rest[..end])
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation error at '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Converts structural validation errors into the envelope field error form.
#[must_use]
pub fn to_field_errors(errors: &[ValidationError]) -> accord_core::FieldErrors {
    let mut fields = accord_core::FieldErrors::new();
    for error in errors {
        let field = error.field().unwrap_or("$");
        fields.add(field, error.message.clone());
    }
    fields
}
