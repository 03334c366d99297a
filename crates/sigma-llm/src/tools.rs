//! Tool definitions, streamed tool-call accumulation, and execution

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use sigma_search::{SearchError, SearchResponse, SearchService};

use crate::types::{FunctionCall, StreamToolCall, ToolCall, ToolDefinition};

/// Name of the web search function exposed to the model
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Merges streamed tool-call fragments into complete calls
///
/// Fragments are keyed by their `index`. The first fragment for an index
/// carries the call id and function name, later ones append argument text.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PartialToolCall>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    /// Fold one streamed fragment into the accumulated state
    pub fn push(&mut self, delta: &StreamToolCall) {
        let call = self.calls.entry(delta.index).or_default();

        if call.id.is_none()
            && let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty())
        {
            call.id = Some(id.to_owned());
        }

        if let Some(function) = &delta.function {
            // Some servers repeat the name on every fragment
            if call.name.is_empty()
                && let Some(name) = &function.name
            {
                call.name.clone_from(name);
            }

            if let Some(arguments) = &function.arguments {
                call.arguments.push_str(arguments);
            }
        }
    }

    /// Complete calls ordered by index
    ///
    /// Calls that never received a function name are dropped.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter_map(|(index, call)| {
                if call.name.is_empty() {
                    tracing::warn!(index, "dropping streamed tool call without a function name");
                    return None;
                }

                Some(ToolCall {
                    id: call.id.unwrap_or_else(|| format!("call_{index}")),
                    function: FunctionCall {
                        name: call.name,
                        arguments: call.arguments,
                    },
                })
            })
            .collect()
    }
}

/// A source document cited by a tool result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Document URL
    pub url: String,
    /// Document title, when known
    pub title: Option<String>,
}

/// Result of executing one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Content of the `tool` message fed back to the model
    pub content: String,
    /// Sources surfaced to the browser as `source-url` parts
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// Error result the model can read and recover from
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: serde_json::json!({ "error": message.into() }).to_string(),
            sources: Vec::new(),
        }
    }
}

/// Executes tool calls requested by the model
///
/// Execution is infallible from the orchestrator's point of view: failures
/// are reported back to the model as error results.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools advertised to the model
    fn definitions(&self) -> Vec<ToolDefinition>;

    /// Run a single call
    async fn execute(&self, call: &ToolCall) -> ToolOutput;
}

/// Arguments of the `web_search` tool
#[derive(Debug, Deserialize)]
struct WebSearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<u32>,
}

/// Exposes [`SearchService`] to the model as the `web_search` function
#[derive(Clone)]
pub struct SearchToolExecutor {
    search: SearchService,
}

impl SearchToolExecutor {
    pub fn new(search: SearchService) -> Self {
        Self { search }
    }

    fn output(response: &SearchResponse) -> Result<ToolOutput, SearchError> {
        let content = serde_json::to_string(response).map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        let sources = response
            .results
            .iter()
            .map(|hit| Source {
                url: hit.url.clone(),
                title: Some(hit.title.clone()).filter(|t| !t.is_empty()),
            })
            .collect();

        Ok(ToolOutput { content, sources })
    }
}

#[async_trait]
impl ToolExecutor for SearchToolExecutor {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::function(
            WEB_SEARCH_TOOL,
            "Search the web for current information. Use this for recent events, live data, \
             or anything you are not confident about.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Number of results to return",
                        "minimum": 1,
                        "maximum": sigma_search::MAX_RESULTS_LIMIT
                    }
                },
                "required": ["query"]
            }),
        )]
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        if call.function.name != WEB_SEARCH_TOOL {
            tracing::warn!(tool = %call.function.name, "model requested an unknown tool");
            return ToolOutput::error(format!("unknown tool: {}", call.function.name));
        }

        let args: WebSearchArgs = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool_call_id = %call.id, error = %e, "malformed web_search arguments");
                return ToolOutput::error(format!("invalid arguments: {e}"));
            }
        };

        match self
            .search
            .search(&args.query, args.max_results)
            .await
            .and_then(|response| Self::output(&response))
        {
            Ok(output) => output,
            Err(e) => ToolOutput::error(format!("web search failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sigma_search::{SearchHit, SearchProvider, SearchQuery};

    use super::*;
    use crate::types::StreamFunctionCall;

    fn fragment(index: u32, id: Option<&str>, name: Option<&str>, arguments: &str) -> StreamToolCall {
        StreamToolCall {
            index,
            id: id.map(ToOwned::to_owned),
            function: Some(StreamFunctionCall {
                name: name.map(ToOwned::to_owned),
                arguments: Some(arguments.to_owned()),
            }),
        }
    }

    #[test]
    fn fragments_merge_by_index() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&fragment(1, Some("call_b"), Some("web_search"), ""));
        acc.push(&fragment(0, Some("call_a"), Some("web_search"), "{\"que"));
        acc.push(&fragment(0, None, None, "ry\":\"rust\"}"));
        acc.push(&fragment(1, None, Some("web_search"), "{\"query\":\"tokio\"}"));

        let calls = acc.finish();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_a");
        assert_eq!(calls[0].function.arguments, r#"{"query":"rust"}"#);
        assert_eq!(calls[1].id, "call_b");
        assert_eq!(calls[1].function.name, "web_search");
        assert_eq!(calls[1].function.arguments, r#"{"query":"tokio"}"#);
    }

    #[test]
    fn missing_id_is_synthesized_and_nameless_calls_dropped() {
        let mut acc = ToolCallAccumulator::default();
        acc.push(&fragment(0, None, Some("web_search"), "{}"));
        acc.push(&fragment(3, Some("orphan"), None, "{}"));

        let calls = acc.finish();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_0");
    }

    struct FakeSearch {
        fail: bool,
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &SearchQuery) -> sigma_search::Result<SearchResponse> {
            if self.fail {
                return Err(SearchError::ConnectionError("timed out".to_owned()));
            }

            Ok(SearchResponse {
                query: query.query.clone(),
                answer: None,
                results: (0..query.max_results)
                    .map(|i| SearchHit {
                        title: format!("Result {i}"),
                        url: format!("https://example.com/{i}"),
                        content: "text".to_owned(),
                        score: None,
                    })
                    .collect(),
            })
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn executor(fail: bool) -> SearchToolExecutor {
        SearchToolExecutor::new(SearchService::new(Arc::new(FakeSearch { fail }), 5))
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_owned(),
            function: FunctionCall {
                name: name.to_owned(),
                arguments: arguments.to_owned(),
            },
        }
    }

    #[tokio::test]
    async fn search_results_become_content_and_sources() {
        let output = executor(false)
            .execute(&call(WEB_SEARCH_TOOL, r#"{"query":"rust","max_results":2}"#))
            .await;

        let content: serde_json::Value = serde_json::from_str(&output.content).unwrap();
        assert_eq!(content["query"], "rust");
        assert_eq!(content["results"].as_array().unwrap().len(), 2);
        assert_eq!(output.sources.len(), 2);
        assert_eq!(output.sources[0].title.as_deref(), Some("Result 0"));
    }

    #[tokio::test]
    async fn failures_are_reported_to_the_model() {
        let unknown = executor(false).execute(&call("get_weather", "{}")).await;
        assert_eq!(unknown.content, r#"{"error":"unknown tool: get_weather"}"#);

        let malformed = executor(false).execute(&call(WEB_SEARCH_TOOL, "{\"query\":")).await;
        assert!(malformed.content.contains("invalid arguments"), "{}", malformed.content);

        let failed = executor(true).execute(&call(WEB_SEARCH_TOOL, r#"{"query":"rust"}"#)).await;
        assert!(failed.content.contains("web search failed"), "{}", failed.content);
        assert!(failed.sources.is_empty());
    }

    #[test]
    fn web_search_schema_requires_query() {
        let definitions = executor(false).definitions();
        assert_eq!(definitions.len(), 1);

        let parameters = definitions[0].function.parameters.as_ref().unwrap();
        assert_eq!(parameters["required"], serde_json::json!(["query"]));
    }
}
