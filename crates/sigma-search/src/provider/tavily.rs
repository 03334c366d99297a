use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sigma_config::SearchDepth;
use url::Url;

use super::SearchProvider;
use crate::{
    error::{Result, SearchError},
    types::{SearchHit, SearchQuery, SearchResponse},
};

/// Default Tavily API base URL
const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Tavily search provider
pub(crate) struct TavilyProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    search_depth: SearchDepth,
    include_answer: bool,
}

impl TavilyProvider {
    /// Create a new Tavily provider
    pub fn new(
        api_key: SecretString,
        base_url: Option<&Url>,
        search_depth: SearchDepth,
        include_answer: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.map_or(DEFAULT_BASE_URL, Url::as_str).trim_end_matches('/').to_owned();

        Ok(Self {
            client,
            api_key,
            base_url,
            search_depth,
            include_answer,
        })
    }
}

/// Wire format for the Tavily search request
#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
    include_answer: bool,
}

/// Wire format for the Tavily search response
#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        if query.query.is_empty() {
            return Err(SearchError::InvalidQuery("query must not be empty".to_owned()));
        }

        let wire_request = TavilyRequest {
            query: &query.query,
            max_results: query.max_results,
            search_depth: self.search_depth.as_str(),
            include_answer: self.include_answer,
        };

        tracing::debug!(query = %query.query, max_results = query.max_results, "sending tavily search");

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "tavily search request failed");
                SearchError::ConnectionError(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_owned());

            tracing::warn!(status = %status, "tavily returned error");

            return Err(match status.as_u16() {
                401 | 403 => SearchError::AuthenticationFailed(message),
                400 | 422 => SearchError::InvalidQuery(message),
                code => SearchError::ProviderApiError { status: code, message },
            });
        }

        let wire_response: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        let results = wire_response
            .results
            .into_iter()
            .take(query.max_results as usize)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
            })
            .collect();

        Ok(SearchResponse {
            query: query.query.clone(),
            answer: wire_response.answer.filter(|a| !a.is_empty()),
            results,
        })
    }

    fn name(&self) -> &str {
        "tavily"
    }
}
