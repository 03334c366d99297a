use serde::{Deserialize, Serialize};

/// Largest number of hits a single search may return
pub const MAX_RESULTS_LIMIT: u32 = 10;

/// A single web search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text query
    pub query: String,
    /// Number of hits wanted, always within `1..=MAX_RESULTS_LIMIT`
    pub max_results: u32,
}

impl SearchQuery {
    /// Build a query, trimming whitespace and clamping the result count
    pub fn new(query: impl Into<String>, max_results: u32) -> Self {
        Self {
            query: query.into().trim().to_owned(),
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
        }
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Relevant extract from the page
    pub content: String,
    /// Backend relevance score, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Search results handed back to the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query that produced these results
    pub query: String,
    /// Short synthesized answer, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Ranked hits
    pub results: Vec<SearchHit>,
}
