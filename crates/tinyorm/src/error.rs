//! Error types for tinyorm

use thiserror::Error;

/// Result type alias for tinyorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement compilation and execution
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrmError {
    /// A raw SQL fragment references a different number of `?` placeholders
    /// than the number of supplied parameters
    #[error("Malformed clause \"{fragment}\": {expected} placeholder(s), {supplied} parameter(s)")]
    MalformedClause {
        fragment: String,
        expected: usize,
        supplied: usize,
    },

    /// A compound-key row is missing one of the declared id columns
    #[error("Missing id column '{0}' in supplied key")]
    MissingIdColumn(String),

    /// A record has no value for one of its id columns at save/delete time
    #[error("Missing value for id column '{0}'")]
    MissingIdValue(String),

    /// Builder misuse detected at compile time
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error reported by the executor, propagated unchanged
    #[error("Executor error: {0}")]
    Executor(String),
}

impl OrmError {
    /// Create a malformed-clause error for a raw fragment
    pub fn malformed_clause(
        fragment: impl Into<String>,
        expected: usize,
        supplied: usize,
    ) -> Self {
        Self::MalformedClause {
            fragment: fragment.into(),
            expected,
            supplied,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an executor error
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    /// Check if this is a malformed-clause error
    pub fn is_malformed_clause(&self) -> bool {
        matches!(self, Self::MalformedClause { .. })
    }
}
