use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sigma_core::{REQUEST_ID_HEADER, RequestContext};

use super::{ImageGenProvider, http_client, status_error};
use crate::{
    error::{ImageGenError, Result},
    types::{ImageGeneration, ImageRequest, ImageUsage},
};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` Images API provider
pub(crate) struct OpenAiImageGenProvider {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    size: Option<String>,
}

impl OpenAiImageGenProvider {
    pub fn new(
        model: String,
        api_key: Option<SecretString>,
        base_url: Option<&url::Url>,
        size: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            base_url: base_url
                .map_or(DEFAULT_BASE_URL, url::Url::as_str)
                .trim_end_matches('/')
                .to_owned(),
            model,
            size,
        })
    }

    /// DALL-E models default to URL output; GPT image models always return
    /// base64 and reject the parameter
    fn response_format(&self) -> Option<&'static str> {
        self.model.starts_with("dall-e").then_some("b64_json")
    }
}

/// Wire format for the `OpenAI` image generation API request
#[derive(Serialize)]
struct OpenAiImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'static str>,
}

/// Wire format for the `OpenAI` image generation API response
#[derive(Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
    #[serde(default)]
    usage: Option<OpenAiImageUsage>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiImageUsage {
    #[serde(default)]
    input_tokens: Option<u32>,
    #[serde(default)]
    output_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

#[async_trait]
impl ImageGenProvider for OpenAiImageGenProvider {
    async fn generate(&self, request: &ImageRequest, context: &RequestContext) -> Result<ImageGeneration> {
        if request.reference_image.is_some() {
            return Err(ImageGenError::InvalidRequest(
                "Reference images are not supported by the configured image provider".to_owned(),
            ));
        }

        let wire_request = OpenAiImageRequest {
            model: &self.model,
            prompt: &request.prompt,
            n: 1,
            size: self.size.as_deref(),
            response_format: self.response_format(),
        };

        tracing::debug!(model = %self.model, "sending image generation request");

        let mut builder = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header(REQUEST_ID_HEADER, &context.request_id)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, "image generation request failed");
            ImageGenError::ConnectionError(e.to_string())
        })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_owned());
            tracing::warn!(status = %status, "OpenAI image generation API error");
            return Err(status_error(status, body));
        }

        let wire_response: OpenAiImageResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::InvalidResponse(e.to_string()))?;

        let text = wire_response
            .data
            .iter()
            .find_map(|d| d.revised_prompt.clone())
            .unwrap_or_default();

        let images = wire_response
            .data
            .into_iter()
            .filter_map(|d| match (d.b64_json, d.url) {
                (Some(b64), _) => Some(format!("data:image/png;base64,{b64}")),
                (None, url) => url,
            })
            .collect();

        let usage = wire_response
            .usage
            .map(|u| ImageUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(ImageGeneration { images, text, usage })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
