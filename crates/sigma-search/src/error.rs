use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

/// Web search errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query was empty or otherwise unusable
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Backend rejected the API key
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Backend returned a non-success status
    #[error("search API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection failure, including timeouts
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Backend answered with a body we could not parse
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Provider could not be built from configuration
    #[error("configuration error: {0}")]
    ConfigError(String),
}
