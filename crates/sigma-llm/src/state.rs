//! Shared chat state built once at startup

use std::sync::Arc;

use sigma_config::ChatConfig;
use sigma_search::SearchService;
use sigma_telemetry::{Counter, Histogram, metrics};

use crate::error::LlmError;
use crate::provider::Provider;
use crate::provider::openai::OpenAiProvider;
use crate::tools::{SearchToolExecutor, ToolExecutor};
use crate::types::CompletionParams;

/// Shared state for chat route handlers
#[derive(Clone)]
pub struct ChatState {
    pub(crate) inner: Arc<ChatStateInner>,
}

pub(crate) struct ChatStateInner {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) tools: Option<Arc<dyn ToolExecutor>>,
    pub(crate) model: String,
    pub(crate) system_prompt: String,
    pub(crate) params: CompletionParams,
    pub(crate) max_tool_rounds: u32,
    pub(crate) emit_sources: bool,
    pub(crate) metrics: ChatMetrics,
}

/// Chat instruments
///
/// Created with the state so they bind to the meter provider installed by
/// telemetry initialization.
pub(crate) struct ChatMetrics {
    pub(crate) requests: Counter<u64>,
    pub(crate) time_to_first_token: Histogram<f64>,
    pub(crate) stream_duration: Histogram<f64>,
    pub(crate) tool_calls: Counter<u64>,
}

impl ChatMetrics {
    fn new() -> Self {
        let meter = metrics::meter();

        Self {
            requests: meter.u64_counter(metrics::CHAT_REQUEST_COUNT).build(),
            time_to_first_token: meter
                .f64_histogram(metrics::CHAT_TIME_TO_FIRST_TOKEN)
                .with_unit("s")
                .build(),
            stream_duration: meter.f64_histogram(metrics::CHAT_STREAM_DURATION).with_unit("s").build(),
            tool_calls: meter.u64_counter(metrics::CHAT_TOOL_CALL_COUNT).build(),
        }
    }
}

impl ChatState {
    /// Assemble state from an existing provider and optional tools
    pub fn new(provider: Arc<dyn Provider>, tools: Option<Arc<dyn ToolExecutor>>, config: &ChatConfig) -> Self {
        Self {
            inner: Arc::new(ChatStateInner {
                provider,
                tools,
                model: config.model.clone(),
                system_prompt: config.system_prompt.clone(),
                params: CompletionParams {
                    temperature: config.temperature,
                    max_tokens: config.max_tokens,
                },
                max_tool_rounds: config.max_tool_rounds,
                emit_sources: config.emit_sources,
                metrics: ChatMetrics::new(),
            }),
        }
    }

    /// Build state from configuration
    ///
    /// Web search is offered to the model as a tool only when `search` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be constructed.
    pub fn from_config(config: &ChatConfig, search: Option<SearchService>) -> Result<Self, LlmError> {
        let provider = OpenAiProvider::new(&config.provider, config.timeout)?;

        let tools = search.map(|search| {
            tracing::debug!(provider = search.provider_name(), "web search tool enabled for chat");
            Arc::new(SearchToolExecutor::new(search)) as Arc<dyn ToolExecutor>
        });

        tracing::debug!(
            provider = %config.provider.name,
            model = %config.model,
            max_tool_rounds = config.max_tool_rounds,
            "chat state initialized"
        );

        Ok(Self::new(Arc::new(provider), tools, config))
    }

    /// System prompt placed ahead of every conversation
    pub fn system_prompt(&self) -> &str {
        &self.inner.system_prompt
    }
}
