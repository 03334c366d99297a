use std::time::Instant;

use sigma_config::{ImageGenConfig, ImageGenProviderType};
use sigma_core::RequestContext;
use sigma_telemetry::{Histogram, KeyValue, metrics};

use crate::{
    error::{ImageGenError, Result},
    provider::{ImageGenProvider, chat::ChatImageGenProvider, openai::OpenAiImageGenProvider},
    types::{GenerateImageRequest, GenerateImageResponse, ImageRequest, is_displayable_image},
};

/// Image generation server wrapping the configured provider
pub struct Server {
    provider: Box<dyn ImageGenProvider>,
    duration: Histogram<f64>,
}

impl Server {
    pub(crate) fn new(provider: Box<dyn ImageGenProvider>) -> Self {
        Self {
            provider,
            duration: metrics::meter()
                .f64_histogram(metrics::IMAGEGEN_REQUEST_DURATION)
                .with_unit("s")
                .build(),
        }
    }

    /// Validate the browser request and generate one image
    pub async fn generate(
        &self,
        request: GenerateImageRequest,
        context: &RequestContext,
    ) -> Result<GenerateImageResponse> {
        let request = validate(request)?;

        let start = Instant::now();
        let result = self.generate_validated(&request, context).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(ImageGenError::NoImage) => "no_image",
            Err(_) => "error",
        };
        metrics::record_duration(
            &self.duration,
            start,
            &[
                KeyValue::new("provider", self.provider.name().to_owned()),
                KeyValue::new("outcome", outcome),
            ],
        );

        result
    }

    async fn generate_validated(
        &self,
        request: &ImageRequest,
        context: &RequestContext,
    ) -> Result<GenerateImageResponse> {
        let generation = self.provider.generate(request, context).await?;
        let returned = generation.images.len();

        let Some(image_url) = generation.images.into_iter().find(|image| is_displayable_image(image)) else {
            tracing::warn!(
                request_id = %context.request_id,
                returned,
                "provider returned no displayable image"
            );
            return Err(ImageGenError::NoImage);
        };

        tracing::debug!(request_id = %context.request_id, returned, "image generated");

        Ok(GenerateImageResponse {
            image_url,
            text: generation.text,
            usage: generation.usage,
        })
    }
}

fn validate(request: GenerateImageRequest) -> Result<ImageRequest> {
    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or(ImageGenError::MissingPrompt)?;

    Ok(ImageRequest {
        prompt,
        reference_image: request.reference_image.filter(|r| !r.is_empty()),
    })
}

/// Builder for constructing the image generation server from configuration
pub struct ImageGenServerBuilder<'a> {
    config: &'a ImageGenConfig,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(config: &'a ImageGenConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Server> {
        let config = self.config;

        if config.api_key.is_none() {
            tracing::warn!("no API key configured for image generation");
        }

        let provider: Box<dyn ImageGenProvider> = match config.provider_type {
            ImageGenProviderType::Chat => Box::new(ChatImageGenProvider::new(
                config.model.clone(),
                config.api_key.clone(),
                config.base_url.as_ref(),
                config.timeout,
            )?),
            ImageGenProviderType::Openai => Box::new(OpenAiImageGenProvider::new(
                config.model.clone(),
                config.api_key.clone(),
                config.base_url.as_ref(),
                config.size.clone(),
                config.timeout,
            )?),
        };

        tracing::debug!(provider = provider.name(), model = %config.model, "image generation server initialized");

        Ok(Server::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::types::{ImageGeneration, ImageUsage};

    struct StaticProvider {
        images: Vec<&'static str>,
    }

    #[async_trait]
    impl ImageGenProvider for StaticProvider {
        async fn generate(&self, request: &ImageRequest, _context: &RequestContext) -> Result<ImageGeneration> {
            Ok(ImageGeneration {
                images: self.images.iter().map(ToString::to_string).collect(),
                text: format!("here is {}", request.prompt),
                usage: ImageUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    fn server(images: Vec<&'static str>) -> Server {
        Server::new(Box::new(StaticProvider { images }))
    }

    fn request(prompt: Option<&str>) -> GenerateImageRequest {
        GenerateImageRequest {
            prompt: prompt.map(ToOwned::to_owned),
            reference_image: None,
        }
    }

    #[tokio::test]
    async fn first_displayable_image_wins() {
        let response = server(vec!["data:text/plain;base64,aGk=", "data:image/webp;base64,UklG", "https://x/y.png"])
            .generate(request(Some("a cat")), &RequestContext::empty())
            .await
            .unwrap();

        assert_eq!(response.image_url, "data:image/webp;base64,UklG");
        assert_eq!(response.text, "here is a cat");
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        for prompt in [None, Some(""), Some("   ")] {
            let err = server(vec!["data:image/png;base64,AAAA"])
                .generate(request(prompt), &RequestContext::empty())
                .await
                .unwrap_err();
            assert!(matches!(err, ImageGenError::MissingPrompt), "{prompt:?}");
        }
    }

    #[tokio::test]
    async fn missing_image_is_reported() {
        let err = server(vec![])
            .generate(request(Some("a cat")), &RequestContext::empty())
            .await
            .unwrap_err();

        assert!(matches!(err, ImageGenError::NoImage));
    }
}
