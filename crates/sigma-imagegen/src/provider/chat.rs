//! Image generation through a chat completions endpoint with image output
//!
//! Used for models such as Gemini image preview served behind an
//! OpenRouter-style gateway, which return images on the assistant message.

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

/// Default gateway base URL
pub(crate) const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub(crate) struct ChatImageGenProvider {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl ChatImageGenProvider {
    pub fn new(
        model: String,
        api_key: Option<SecretString>,
        base_url: Option<&url::Url>,
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
        })
    }
}

#[derive(Serialize)]
struct ChatImageRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    modalities: [&'static str; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: ChatContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ChatContent<'a> {
    Text(&'a str),
    Parts(Vec<ChatContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatContentPart<'a> {
    ImageUrl { image_url: ImageUrl<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatImageResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    images: Vec<ChatImage>,
}

#[derive(Deserialize)]
struct ChatImage {
    image_url: ChatImageUrl,
}

#[derive(Deserialize)]
struct ChatImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl From<ChatUsage> for ImageUsage {
    fn from(usage: ChatUsage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[async_trait]
impl ImageGenProvider for ChatImageGenProvider {
    async fn generate(&self, request: &ImageRequest, context: &RequestContext) -> Result<ImageGeneration> {
        // The reference image goes first so the prompt reads as an instruction about it
        let content = match &request.reference_image {
            Some(reference) => ChatContent::Parts(vec![
                ChatContentPart::ImageUrl {
                    image_url: ImageUrl { url: reference },
                },
                ChatContentPart::Text { text: &request.prompt },
            ]),
            None => ChatContent::Text(&request.prompt),
        };

        let wire_request = ChatImageRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content }],
            modalities: ["image", "text"],
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            with_reference = request.reference_image.is_some(),
            "sending image generation request"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
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
            tracing::warn!(status = %status, "image generation API error");
            return Err(status_error(status, body));
        }

        let wire_response: ChatImageResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::InvalidResponse(e.to_string()))?;

        let usage = wire_response.usage.map(Into::into).unwrap_or_default();

        let Some(choice) = wire_response.choices.into_iter().next() else {
            return Ok(ImageGeneration {
                usage,
                ..ImageGeneration::default()
            });
        };

        Ok(ImageGeneration {
            images: choice.message.images.into_iter().map(|image| image.image_url.url).collect(),
            text: choice.message.content.unwrap_or_default(),
            usage,
        })
    }

    fn name(&self) -> &str {
        "chat"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Json, Router, routing};

    use super::*;

    async fn spawn(app: Router) -> url::Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.ok() });
        format!("http://{addr}/api/v1").parse().unwrap()
    }

    async fn handle(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
        assert_eq!(body["modalities"], serde_json::json!(["image", "text"]));
        assert_eq!(body["stream"], false);

        let content = &body["messages"][0]["content"];
        let text = if content.is_string() {
            "plain".to_owned()
        } else {
            assert_eq!(content[0]["type"], "image_url");
            assert_eq!(content[1]["type"], "text");
            format!("edited {}", content[0]["image_url"]["url"].as_str().unwrap())
        };

        Json(serde_json::json!({
            "id": "gen-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": text,
                    "images": [{"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}]
                },
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 7, "completion_tokens": 1290, "total_tokens": 1297}
        }))
    }

    async fn provider() -> ChatImageGenProvider {
        let base = spawn(Router::new().route("/api/v1/chat/completions", routing::post(handle))).await;
        ChatImageGenProvider::new(
            "google/gemini-2.5-flash-image-preview".to_owned(),
            Some(SecretString::from("sk-or-test")),
            Some(&base),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn prompt_only_request() {
        let request = ImageRequest {
            prompt: "a red fox".to_owned(),
            reference_image: None,
        };

        let generation = provider().await.generate(&request, &RequestContext::empty()).await.unwrap();

        assert_eq!(generation.images, ["data:image/png;base64,AAAA"]);
        assert_eq!(generation.text, "plain");
        assert_eq!(generation.usage.input_tokens, Some(7));
        assert_eq!(generation.usage.total_tokens, Some(1297));
    }

    #[tokio::test]
    async fn reference_image_precedes_prompt() {
        let request = ImageRequest {
            prompt: "make it blue".to_owned(),
            reference_image: Some("data:image/jpeg;base64,BBBB".to_owned()),
        };

        let generation = provider().await.generate(&request, &RequestContext::empty()).await.unwrap();

        assert_eq!(generation.text, "edited data:image/jpeg;base64,BBBB");
    }
}
