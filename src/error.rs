//! Error types for newsgrab.

use thiserror::Error;

/// Common error type for newsgrab.
#[derive(Error, Debug)]
pub enum NewsgrabError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Transport failure while talking to a feed source.
    #[error("source error: {0}")]
    Source(String),

    /// A feed source answered with something we could not decode.
    #[error("decode error: {0}")]
    Decode(String),

    /// Notification delivery failed.
    #[error("notify error: {0}")]
    Notify(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for NewsgrabError {
    fn from(e: sqlx::Error) -> Self {
        NewsgrabError::Database(e.to_string())
    }
}

/// Result type alias for newsgrab operations.
pub type Result<T> = std::result::Result<T, NewsgrabError>;
