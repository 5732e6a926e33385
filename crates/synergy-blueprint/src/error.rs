//! Error types for blueprint generation.

use thiserror::Error;

/// Result type for blueprint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input outside the domain of the generator (zero rooms, missing
    /// fields, non-image uploads, unparseable counts).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
