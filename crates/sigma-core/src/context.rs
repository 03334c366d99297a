/// Header carrying the per-request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request id that is reused as-is
const MAX_REQUEST_ID_LEN: usize = 128;

/// Runtime context for a single chat or image request
///
/// Built by the server middleware and passed down to providers so that
/// upstream calls and log lines can be correlated with the browser request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identifier for log correlation, taken from `x-request-id` when the
    /// client supplies one
    pub request_id: String,
}

impl RequestContext {
    /// Create a context from incoming request headers
    ///
    /// Reuses a well-formed `x-request-id` header, otherwise generates one
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
            .map_or_else(new_request_id, ToOwned::to_owned);

        Self { request_id }
    }

    /// Create a context for use outside an HTTP request
    pub fn empty() -> Self {
        Self {
            request_id: new_request_id(),
        }
    }
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
