use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Web search tool configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Offer the `web_search` tool to the chat model
    #[serde(default)]
    pub enabled: bool,
    /// Search backend
    #[serde(default, rename = "type")]
    pub provider_type: SearchProviderType,
    /// API key for the search backend
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Results requested when the model does not ask for a specific count
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Search depth hint passed to the backend
    #[serde(default)]
    pub search_depth: SearchDepth,
    /// Ask the backend for a short synthesized answer alongside the hits
    #[serde(default)]
    pub include_answer: bool,
    /// Upper bound for a single search call
    #[serde(default = "crate::duration::default_timeout", deserialize_with = "crate::duration::deserialize")]
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_type: SearchProviderType::default(),
            api_key: None,
            base_url: None,
            max_results: default_max_results(),
            search_depth: SearchDepth::default(),
            include_answer: false,
            timeout: crate::duration::default_timeout(),
        }
    }
}

/// Supported search backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProviderType {
    /// Tavily search API
    #[default]
    Tavily,
}

/// How thoroughly the backend should search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDepth {
    /// Fast, cheaper lookups
    #[default]
    Basic,
    /// Slower, more thorough lookups
    Advanced,
}

impl SearchDepth {
    /// Wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

const fn default_max_results() -> u32 {
    5
}
