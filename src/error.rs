//! Error types for minorm.

use std::time::Duration;

use thiserror::Error;

/// The main error type for minorm operations.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Entity metadata is missing or inconsistent (e.g. no key defined).
    #[error("Schema error: {0}")]
    Schema(String),

    /// The predicate contains a construct the translator cannot lower.
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// A caller-supplied argument is out of range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failed to parse a filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The command did not complete within its timeout.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrmError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create an unsupported-predicate error naming the offending construct.
    pub fn unsupported(construct: impl Into<String>) -> Self {
        Self::UnsupportedPredicate(construct.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias for minorm operations.
pub type OrmResult<T> = Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrmError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_taxonomy_display() {
        assert_eq!(
            OrmError::schema("no key defined").to_string(),
            "Schema error: no key defined"
        );
        assert_eq!(
            OrmError::unsupported("Substring").to_string(),
            "Unsupported predicate: Substring"
        );
        assert_eq!(
            OrmError::validation("page size must be >= 0").to_string(),
            "Validation error: page size must be >= 0"
        );
    }
}
