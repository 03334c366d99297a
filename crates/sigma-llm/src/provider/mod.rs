//! Provider trait and the OpenAI-compatible backend

pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use sigma_core::RequestContext;

use crate::error::LlmError;
use crate::types::{CompletionRequest, StreamEvent};

/// Stream of events produced by one upstream completion
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Trait implemented by each chat completion backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Send a streaming completion request
    ///
    /// Resolves once the upstream has accepted the request; failures while
    /// reading the body surface as `Err` items on the stream.
    async fn complete_stream(
        &self,
        request: &CompletionRequest,
        context: &RequestContext,
    ) -> Result<EventStream, LlmError>;
}
