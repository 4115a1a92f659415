//! Contract integrity errors.

use accord_core::AccordError;
use thiserror::Error;

/// Errors raised while loading, merging, or verifying a contract.
///
/// Any of these makes binding generation impossible; generation fails before
/// touching existing bindings.
#[derive(Error, Debug)]
pub enum ContractError {
    /// A schema or endpoint references a schema name that does not exist.
    #[error("schema reference '{name}' is undefined (referenced by {referenced_by})")]
    UndefinedSchemaRef {
        /// The missing schema name.
        name: String,
        /// The schema or endpoint holding the reference.
        referenced_by: String,
    },

    /// Two schemas share a name but differ in shape.
    #[error("schema '{name}' is defined more than once with different shapes")]
    SchemaCollision {
        /// The colliding schema name.
        name: String,
    },

    /// A schema participates in a reference cycle.
    ///
    /// Generated bindings are plain structs without indirection, so no cycle
    /// is representable.
    #[error("schema '{name}' has a circular definition: {cycle}")]
    CircularSchema {
        /// The schema where the cycle was detected.
        name: String,
        /// The cycle rendered as `A -> B -> A`.
        cycle: String,
    },

    /// Two endpoints share an operation ID.
    #[error("operation '{operation_id}' is defined more than once")]
    DuplicateOperation {
        /// The duplicated operation ID.
        operation_id: String,
    },

    /// The document could not be interpreted as a contract.
    #[error("invalid contract document: {message}")]
    InvalidDocument {
        /// Description of the problem.
        message: String,
    },

    /// The document could not be parsed as JSON.
    #[error("failed to parse contract document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document could not be read.
    #[error("failed to read contract document: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Creates an [`InvalidDocument`](Self::InvalidDocument) error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

impl From<ContractError> for AccordError {
    fn from(err: ContractError) -> Self {
        Self::contract(err.to_string())
    }
}
