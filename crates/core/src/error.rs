//! Unified error types for pagelens.
//!
//! Every variant renders with a stable, upper-case code prefix so callers
//! on the other side of the MCP transport can match on it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for pagelens.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., missing URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No captured error has the requested id.
    #[error("ERROR_NOT_FOUND: {0}")]
    ErrorNotFound(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored or supplied value could not be (de)serialized.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A value is larger than the namespace allows per item.
    #[error("QUOTA_EXCEEDED: {key} is {size} bytes (max {max})")]
    QuotaExceeded { key: String, size: usize, max: usize },

    /// An AI-backed operation was requested without an AI configuration.
    #[error("AI_NOT_CONFIGURED")]
    AiNotConfigured,

    /// The AI provider answered with a non-success status.
    #[error("AI_HTTP_ERROR: {0}")]
    AiHttpError(String),

    /// The AI provider answered with an unexpected body.
    #[error("AI_INVALID_RESPONSE: {0}")]
    AiInvalidResponse(String),

    /// The AI request could not be sent or timed out.
    #[error("AI_REQUEST_FAILED: {0}")]
    AiRequestFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::ErrorNotFound(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Serialization(e) => (-32003, e.to_string()),
            Error::QuotaExceeded { .. } => (-32004, err.to_string()),
            Error::AiNotConfigured => (-32010, "AI provider is not configured".to_string()),
            Error::AiHttpError(msg) => (-32011, msg.clone()),
            Error::AiInvalidResponse(msg) => (-32012, msg.clone()),
            Error::AiRequestFailed(msg) => (-32013, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
