use http::StatusCode;
use sigma_core::HttpError;
use thiserror::Error;

/// Message returned to the browser when a chat cannot be started
pub const CHAT_FAILED_MESSAGE: &str = "Failed to process chat request";

/// Message carried by the `error` stream part when a chat fails mid-stream
pub const STREAM_FAILED_MESSAGE: &str = "An error occurred while processing your request.";

/// Errors that can occur while serving a chat
#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream provider returned an error or could not be reached
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Error while reading the upstream stream
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider could not be built from configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Streaming(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::Streaming(_) => "streaming_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Config(_) => "configuration_error",
        }
    }

    /// Upstream details stay in the logs; the browser only learns whether
    /// its own request was at fault
    fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            _ => CHAT_FAILED_MESSAGE.to_owned(),
        }
    }
}
