use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sigma_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Image generation errors
///
/// Only the prompt and reference checks are reported to the browser in
/// detail; everything else collapses into a generic message.
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Prompt was missing or blank
    #[error("No prompt provided")]
    MissingPrompt,

    /// Request cannot be served by the configured provider
    #[error("{0}")]
    InvalidRequest(String),

    /// Provider answered without any usable image
    #[error("No image was generated")]
    NoImage,

    /// Provider rejected the API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Provider API returned an error
    #[error("Provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error, including timeouts
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Provider answered with a body we could not parse
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request body could not be read
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl HttpError for ImageGenError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPrompt | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::MissingPrompt | Self::InvalidRequest(_) | Self::MalformedRequest(_) => "invalid_request_error",
            Self::NoImage => "no_image_error",
            Self::AuthenticationFailed(_) => "authentication_error",
            Self::ConnectionError(_) | Self::ProviderApiError { .. } | Self::InvalidResponse(_) => "api_error",
            Self::ConfigError(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::MissingPrompt | Self::InvalidRequest(_) | Self::NoImage => self.to_string(),
            _ => "Failed to generate image".to_owned(),
        }
    }
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type = self.error_type(), "image generation failed");
        }

        (status, Json(serde_json::json!({ "error": self.client_message() }))).into_response()
    }
}
