//! Error types for sieve.

use thiserror::Error;

/// Result type alias for sieve operations.
pub type Result<T> = std::result::Result<T, SieveError>;

/// Errors that can occur in sieve operations.
#[derive(Error, Debug)]
pub enum SieveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Object store transport or protocol error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Search index transport or query error
    #[error("Search error: {0}")]
    Search(String),

    /// Scroll cursor missing, expired or rejected by the index
    #[error("Invalid scroll cursor: {0}")]
    InvalidCursor(String),

    /// A paginated API returned something the caller cannot make progress on
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Input that cannot be normalized (e.g. not UTF-8)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Precondition violation on an argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Target already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
