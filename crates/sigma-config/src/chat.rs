use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// System prompt sent ahead of every conversation unless overridden
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You're Sigma-AI! A smart AI model that answers questions of users. Be concise, helpful, and accurate.";

/// Model used when none is configured
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Chat completion configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Upstream provider settings
    #[serde(default)]
    pub provider: ChatProviderConfig,
    /// Model identifier sent upstream
    #[serde(default = "default_model")]
    pub model: String,
    /// System prompt prepended to every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum tokens generated per model round
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// How many times the model may be re-entered with tool results
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Emit `source-url` parts for search hits in the UI stream
    #[serde(default = "default_true")]
    pub emit_sources: bool,
    /// Upper bound for a single upstream call, streaming included
    #[serde(default = "crate::duration::default_timeout", deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ChatProviderConfig::default(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: None,
            max_tokens: None,
            max_tool_rounds: default_max_tool_rounds(),
            emit_sources: true,
            timeout: crate::duration::default_timeout(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatProviderConfig {
    /// Display name used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override (defaults to Groq's OpenAI-compatible API)
    #[serde(default)]
    pub base_url: Option<Url>,
}

impl Default for ChatProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_key: None,
            base_url: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_CHAT_MODEL.to_owned()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_owned()
}

fn default_provider_name() -> String {
    "groq".to_owned()
}

const fn default_max_tool_rounds() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}
