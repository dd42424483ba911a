//! Error types for the agenda pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Agenda pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// No document matched the requested item
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Document listing succeeded but the byte stream could not be opened
    #[error("Document stream unavailable: {0}")]
    StreamUnavailable(String),

    /// No usable text could be extracted (includes scanned documents
    /// without a text layer)
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    /// Transport-level failure from the completion model
    #[error("Model request failed: {0}")]
    Model(String),

    /// Model response could not be recovered into a valid record array
    #[error("Response parse failed: {0}")]
    Parse(String),

    /// Driver-level database error
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Inserts ran without error but committed fewer rows than submitted
    #[error("Partial persistence: {committed} of {submitted} rows committed")]
    PartialPersistence { committed: usize, submitted: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a stream-unavailable error
    pub fn stream_unavailable(message: impl Into<String>) -> Self {
        Self::StreamUnavailable(message.into())
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Create a model transport error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Error::StreamUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "stream_unavailable", msg.clone())
            }
            Error::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "extraction_error",
                msg.clone(),
            ),
            Error::Model(msg) => (StatusCode::SERVICE_UNAVAILABLE, "model_error", msg.clone()),
            Error::Parse(msg) => (StatusCode::BAD_GATEWAY, "parse_error", msg.clone()),
            Error::Persistence(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "persistence_error",
                msg.clone(),
            ),
            Error::PartialPersistence { committed, submitted } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "partial_persistence",
                format!("{} of {} rows committed", committed, submitted),
            ),
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
