//! AI chat client error types.

use std::sync::Arc;

use pagelens_core::Error;

/// Errors from the AI chat-completion client.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No API key configured.
    #[error("missing API key")]
    MissingApiKey,

    /// No endpoint configured and the provider has no default.
    #[error("missing endpoint")]
    MissingEndpoint,

    /// No model configured and the provider has no default.
    #[error("missing model")]
    MissingModel,

    /// Endpoint is not a usable URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {reason}")]
    HttpError { status: u16, reason: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// The reply did not have the expected shape.
    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { AiError::Timeout } else { AiError::Network(Arc::new(err)) }
    }
}

impl From<AiError> for Error {
    fn from(err: AiError) -> Self {
        match err {
            AiError::MissingApiKey | AiError::MissingEndpoint | AiError::MissingModel | AiError::InvalidEndpoint(_) => {
                Error::InvalidInput(err.to_string())
            }
            AiError::HttpError { .. } => Error::AiHttpError(err.to_string()),
            AiError::InvalidResponse(msg) => Error::AiInvalidResponse(msg),
            AiError::Timeout | AiError::Network(_) => Error::AiRequestFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AiError::HttpError { status: 401, reason: "Unauthorized".to_string() };
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");

        let err = AiError::InvalidResponse("no choices".to_string());
        assert!(err.to_string().contains("invalid response"));
    }

    #[test]
    fn test_into_core_error() {
        let err: Error = AiError::HttpError { status: 500, reason: "Internal Server Error".to_string() }.into();
        assert!(matches!(err, Error::AiHttpError(ref msg) if msg == "HTTP 500: Internal Server Error"));

        let err: Error = AiError::Timeout.into();
        assert!(matches!(err, Error::AiRequestFailed(_)));

        let err: Error = AiError::MissingApiKey.into();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
