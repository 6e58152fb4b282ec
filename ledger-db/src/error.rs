//! Database error types

use thiserror::Error;

/// Database error type
#[derive(Error, Debug)]
pub enum DbError {
    /// Sled error
    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Key not found
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error
    #[error("Database error: {0}")]
    Other(String),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;
