//! Error types for valuation.

use thiserror::Error;

/// Result type for valuation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while valuing Pi or property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Negative or non-finite amounts, unknown source types, empty market data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
