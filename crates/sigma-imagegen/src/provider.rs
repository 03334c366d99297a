pub(crate) mod chat;
pub(crate) mod openai;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use sigma_core::RequestContext;

use crate::{
    error::{ImageGenError, Result},
    types::{ImageGeneration, ImageRequest},
};

/// Trait for image generation provider implementations
#[async_trait]
pub(crate) trait ImageGenProvider: Send + Sync {
    /// Generate images for the given request
    async fn generate(&self, request: &ImageRequest, context: &RequestContext) -> Result<ImageGeneration>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// HTTP client shared by the providers
pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ImageGenError::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// Map a non-success upstream status to an error
pub(crate) fn status_error(status: StatusCode, body: String) -> ImageGenError {
    match status.as_u16() {
        401 | 403 => ImageGenError::AuthenticationFailed(body),
        code => ImageGenError::ProviderApiError { status: code, message: body },
    }
}
