//! Typed error hierarchy for queue-warden
//!
//! Every error type includes context about what went wrong and whether
//! the operation can be retried on a later polling pass.

use thiserror::Error;

/// Main error type for rule evaluation and strike accounting
#[derive(Debug, Error)]
pub enum WardenError {
    /// Invalid input from the caller
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    /// A rule failed its sanity checks
    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    /// A rule's progress interval collides with an existing rule
    #[error("Interval conflict: {message}")]
    IntervalConflict { message: String },

    /// Rule or tracked item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Strike store failure
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error (bug)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WardenError {
    /// Check if this error is retryable
    ///
    /// Only ledger failures are transient; configuration errors stay broken
    /// until an operator edits the rule.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Create an invalid input error
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Create an invalid rule error
    pub fn invalid_rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for warden operations
pub type Result<T> = std::result::Result<T, WardenError>;

#[cfg(feature = "storage")]
impl From<rusqlite::Error> for WardenError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        Self::Database(format!("I/O error: {}", err))
    }
}
