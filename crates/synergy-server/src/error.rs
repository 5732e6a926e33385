//! Error types for the Synergy node.

use crate::partner::PartnerError;
use crate::pi_client::PiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Blueprint generation rejected the request
    #[error(transparent)]
    Blueprint(#[from] synergy_blueprint::Error),

    /// Valuation rejected the request
    #[error(transparent)]
    Valuation(#[from] synergy_valuation::Error),

    /// Company directory failed to load
    #[error("Directory error: {0}")]
    Directory(#[from] synergy_directory::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller could not be authenticated
    #[error("{0}")]
    Unauthorized(String),

    /// Missing or malformed configuration
    #[error("{0}")]
    Config(String),

    /// A Pi Platform call failed
    #[error("{message}: {source}")]
    Pi {
        message: &'static str,
        #[source]
        source: PiError,
    },

    /// The partner app could not be reached or refused the call
    #[error("Failed to communicate with Triumph: {0}")]
    Partner(#[source] PartnerError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Blueprint(_) | Error::Valuation(_) | Error::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Pi { source, .. } => match source {
                PiError::InvalidPaymentId(_) => StatusCode::BAD_REQUEST,
                PiError::Transport(_) => StatusCode::BAD_GATEWAY,
                PiError::Upstream { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
            },
            Error::Directory(_) | Error::Config(_) | Error::Partner(_) | Error::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message shown to HTTP clients.
    fn public_message(&self) -> String {
        match self {
            Error::Blueprint(synergy_blueprint::Error::InvalidInput(msg))
            | Error::Valuation(synergy_valuation::Error::InvalidInput(msg))
            | Error::InvalidInput(msg)
            | Error::Unauthorized(msg)
            | Error::Config(msg) => msg.clone(),
            Error::NotFound(what) => format!("{what} not found"),
            Error::Pi { message, .. } => (*message).to_string(),
            Error::Partner(_) => "Failed to communicate with Triumph".to_string(),
            Error::Directory(_) | Error::Io(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = match &self {
            Error::Pi { source: PiError::Upstream { details, .. }, .. } => {
                json!({ "error": self.public_message(), "details": details })
            }
            Error::Pi { source, .. } => {
                json!({ "error": self.public_message(), "details": source.to_string() })
            }
            _ => json!({ "error": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}
