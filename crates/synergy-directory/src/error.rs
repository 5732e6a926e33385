//! Error types for the directory.

use thiserror::Error;

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or querying the directory.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed revenue strings and similar bad data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dataset is not valid JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
