//! Web search backends used as a chat tool
//!
//! The chat orchestrator exposes these results to the model through a
//! `web_search` function call.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod provider;
mod types;

use std::sync::Arc;
use std::time::Instant;

use sigma_config::{SearchConfig, SearchProviderType};
use sigma_telemetry::{Histogram, KeyValue, metrics};

pub use error::{Result, SearchError};
pub use provider::SearchProvider;
pub use types::{MAX_RESULTS_LIMIT, SearchHit, SearchQuery, SearchResponse};

use provider::tavily::TavilyProvider;

/// Search entry point shared by all chat requests
#[derive(Clone)]
pub struct SearchService {
    provider: Arc<dyn SearchProvider>,
    default_max_results: u32,
    duration: Histogram<f64>,
}

impl SearchService {
    /// Wrap an existing provider
    pub fn new(provider: Arc<dyn SearchProvider>, default_max_results: u32) -> Self {
        Self {
            provider,
            default_max_results,
            duration: metrics::meter().f64_histogram(metrics::SEARCH_DURATION).build(),
        }
    }

    /// Build the service from configuration
    ///
    /// Returns `Ok(None)` when search is disabled.
    pub fn from_config(config: &SearchConfig) -> Result<Option<Self>> {
        if !config.enabled {
            tracing::debug!("web search disabled");
            return Ok(None);
        }

        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| SearchError::ConfigError("API key required for web search".to_owned()))?;

        let provider: Arc<dyn SearchProvider> = match config.provider_type {
            SearchProviderType::Tavily => Arc::new(TavilyProvider::new(
                api_key,
                config.base_url.as_ref(),
                config.search_depth,
                config.include_answer,
                config.timeout,
            )?),
        };

        tracing::debug!(provider = provider.name(), "web search enabled");

        Ok(Some(Self::new(provider, config.max_results)))
    }

    /// Run a search, falling back to the configured result count
    pub async fn search(&self, query: &str, max_results: Option<u32>) -> Result<SearchResponse> {
        let query = SearchQuery::new(query, max_results.unwrap_or(self.default_max_results));

        let start = Instant::now();
        let result = self.provider.search(&query).await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::record_duration(
            &self.duration,
            start,
            &[
                KeyValue::new("provider", self.provider.name().to_owned()),
                KeyValue::new("outcome", outcome),
            ],
        );

        match &result {
            Ok(response) => tracing::debug!(
                query = %query.query,
                hits = response.results.len(),
                "web search complete"
            ),
            Err(e) => tracing::warn!(query = %query.query, error = %e, "web search failed"),
        }

        result
    }

    /// Name of the backing provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
