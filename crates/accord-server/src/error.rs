//! Server error types.

use thiserror::Error;

/// Errors that can occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("failed to bind: {0}")]
    Bind(String),

    /// A required component was not supplied to the builder.
    #[error("server builder is missing {0}")]
    MissingComponent(&'static str),

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::Bind("address in use".to_string());
        assert_eq!(err.to_string(), "failed to bind: address in use");

        let err = ServerError::MissingComponent("contract");
        assert!(err.to_string().contains("contract"));
    }
}
