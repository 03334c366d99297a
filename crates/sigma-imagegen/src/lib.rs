//! Image generation for Sigma
//!
//! Serves `POST /api/generate-image` on top of either a chat completions
//! endpoint with image output or the `OpenAI` Images API.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod provider;
mod server;
mod types;

use std::sync::Arc;

use axum::{Json, Router, extract::State, extract::rejection::JsonRejection, routing::post};
use sigma_config::ImageGenConfig;
use sigma_core::RequestContext;

pub use error::{ImageGenError, Result};
pub use server::Server;
pub use types::{GenerateImageRequest, GenerateImageResponse, ImageUsage};

use server::ImageGenServerBuilder;

/// Build the image generation server from configuration
///
/// # Errors
///
/// Returns an error if the server fails to initialize
pub fn build_server(config: &ImageGenConfig) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        ImageGenServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for image generation
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new().route("/api/generate-image", post(generate))
}

/// Handle image generation requests
async fn generate(
    State(server): State<Arc<Server>>,
    axum::Extension(context): axum::Extension<RequestContext>,
    payload: std::result::Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>> {
    let Json(request) = payload.map_err(|e| ImageGenError::MalformedRequest(e.body_text()))?;

    tracing::debug!(
        request_id = %context.request_id,
        with_reference = request.reference_image.is_some(),
        "image generation handler called"
    );

    let response = server.generate(request, &context).await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        // Nothing listens on port 9, so any upstream call fails fast
        let config = ImageGenConfig {
            base_url: Some("http://127.0.0.1:9/v1".parse().unwrap()),
            ..ImageGenConfig::default()
        };

        endpoint_router()
            .with_state(build_server(&config).unwrap())
            .layer(axum::Extension(RequestContext::empty()))
    }

    async fn post(body: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(
                Request::post("/api/generate-image")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn missing_prompt_is_bad_request() {
        let (status, body) = post(r#"{"referenceImage":"data:image/png;base64,AAAA"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"No prompt provided"}"#);
    }

    #[tokio::test]
    async fn malformed_body_is_generic_failure() {
        let (status, body) = post("{oops").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Failed to generate image"}"#);
    }

    #[tokio::test]
    async fn unreachable_provider_is_generic_failure() {
        let (status, body) = post(r#"{"prompt":"a cat"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"Failed to generate image"}"#);
    }
}
