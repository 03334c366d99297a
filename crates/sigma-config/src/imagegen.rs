use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Model used when none is configured
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";

/// Image generation configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Provider protocol
    #[serde(default, rename = "type")]
    pub provider_type: ImageGenProviderType,
    /// Model identifier sent upstream
    #[serde(default = "default_model")]
    pub model: String,
    /// API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Image size hint for the Images API (e.g. "1024x1024")
    #[serde(default)]
    pub size: Option<String>,
    /// Upper bound for a single generation call
    #[serde(default = "default_timeout", deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
}

impl Default for ImageGenConfig {
    fn default() -> Self {
        Self {
            provider_type: ImageGenProviderType::default(),
            model: default_model(),
            api_key: None,
            base_url: None,
            size: None,
            timeout: default_timeout(),
        }
    }
}

/// Supported image generation protocols
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageGenProviderType {
    /// Chat completions with image output modality (OpenRouter style)
    #[default]
    Chat,
    /// `OpenAI` Images API
    Openai,
}

fn default_model() -> String {
    DEFAULT_IMAGE_MODEL.to_owned()
}

// Image models are slow; allow twice the usual upstream budget
const fn default_timeout() -> Duration {
    Duration::from_secs(60)
}
