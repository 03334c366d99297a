pub(crate) mod tavily;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{SearchQuery, SearchResponse},
};

/// Trait for web search backend implementations
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a search and return ranked hits
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;

    /// Get the provider name
    fn name(&self) -> &str;
}
