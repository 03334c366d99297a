//! Multi-round chat streaming with tool execution
//!
//! A chat is served by a background task that reads upstream completion
//! rounds and writes UI stream events into a channel. When a round ends with
//! tool calls and the round budget allows, the calls are executed
//! concurrently, their results are appended to the conversation and the
//! model is asked again.

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{Stream, StreamExt, future::join_all};
use sigma_core::RequestContext;
use sigma_telemetry::{KeyValue, metrics};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::error::{LlmError, STREAM_FAILED_MESSAGE};
use crate::provider::EventStream;
use crate::state::{ChatState, ChatStateInner};
use crate::tools::{ToolCallAccumulator, ToolExecutor};
use crate::types::{CompletionRequest, FinishReason, Message, StreamEvent, ToolCall, ToolChoice, Usage};
use crate::ui_stream::{UiStreamEvent, new_id};

/// Stream of UI events for one chat response
pub type UiEventStream = Pin<Box<dyn Stream<Item = UiStreamEvent> + Send>>;

const CHANNEL_CAPACITY: usize = 64;

impl ChatState {
    /// Start streaming an assistant response for `messages`
    ///
    /// The first upstream round is opened before returning so that a failing
    /// provider can still be reported with an error status. Anything that
    /// goes wrong afterwards ends the stream with an `error` event.
    ///
    /// # Errors
    ///
    /// Returns an error if the first upstream request fails.
    pub async fn stream_chat(&self, messages: Vec<Message>, context: RequestContext) -> Result<UiEventStream, LlmError> {
        let run = ChatRun::new(Arc::clone(&self.inner), messages, context);
        let model = KeyValue::new("model", self.inner.model.clone());

        let upstream = match run.open_round().await {
            Ok(upstream) => upstream,
            Err(e) => {
                self.inner
                    .metrics
                    .requests
                    .add(1, &[model, KeyValue::new("outcome", "error")]);
                tracing::error!(request_id = %run.context.request_id, error = %e, "failed to open chat stream");
                return Err(e);
            }
        };

        self.inner
            .metrics
            .requests
            .add(1, &[model, KeyValue::new("outcome", "success")]);

        let span = tracing::info_span!("chat_stream", request_id = %run.context.request_id);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run.drive(upstream, tx).instrument(span));

        let stream = futures_util::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) });

        Ok(Box::pin(stream))
    }
}

/// Why a run stopped early
enum RunError {
    /// The client went away; nothing more can be delivered
    Disconnected,
    /// Upstream or tool failure
    Failed(LlmError),
}

impl From<LlmError> for RunError {
    fn from(e: LlmError) -> Self {
        Self::Failed(e)
    }
}

struct Emitter {
    tx: mpsc::Sender<UiStreamEvent>,
}

impl Emitter {
    async fn send(&self, event: UiStreamEvent) -> Result<(), RunError> {
        self.tx.send(event).await.map_err(|_| RunError::Disconnected)
    }
}

/// What one upstream round produced
#[derive(Default)]
struct Round {
    text_id: Option<String>,
    text: String,
    tool_calls: ToolCallAccumulator,
    finish_reason: Option<FinishReason>,
}

/// State of a single chat response across rounds
struct ChatRun {
    state: Arc<ChatStateInner>,
    request: CompletionRequest,
    context: RequestContext,
    tool_rounds: u32,
    started: Instant,
    first_token_seen: bool,
    usage: Usage,
    sent_sources: HashSet<String>,
}

impl ChatRun {
    fn new(state: Arc<ChatStateInner>, messages: Vec<Message>, context: RequestContext) -> Self {
        let offer_tools = state.max_tool_rounds > 0;
        let tools = state
            .tools
            .as_ref()
            .filter(|_| offer_tools)
            .map(|tools| tools.definitions())
            .filter(|definitions| !definitions.is_empty());

        let request = CompletionRequest {
            model: state.model.clone(),
            messages,
            params: state.params.clone(),
            tool_choice: tools.as_ref().map(|_| ToolChoice::Auto),
            tools,
        };

        Self {
            state,
            request,
            context,
            tool_rounds: 0,
            started: Instant::now(),
            first_token_seen: false,
            usage: Usage::default(),
            sent_sources: HashSet::new(),
        }
    }

    async fn open_round(&self) -> Result<EventStream, LlmError> {
        tracing::debug!(
            provider = self.state.provider.name(),
            model = %self.request.model,
            messages = self.request.messages.len(),
            tools = self.request.tools.as_ref().map_or(0, Vec::len),
            "opening upstream round"
        );

        self.state.provider.complete_stream(&self.request, &self.context).await
    }

    /// Run to completion, reporting failures on the stream
    async fn drive(mut self, upstream: EventStream, tx: mpsc::Sender<UiStreamEvent>) {
        let emitter = Emitter { tx };

        let outcome = match self.run(upstream, &emitter).await {
            Ok(()) => "success",
            Err(RunError::Disconnected) => {
                tracing::debug!("client disconnected before the chat completed");
                "disconnected"
            }
            Err(RunError::Failed(e)) => {
                tracing::error!(error = %e, "chat stream failed");
                let event = UiStreamEvent::Error {
                    error_text: STREAM_FAILED_MESSAGE.to_owned(),
                };
                // The client may already be gone
                let _ = emitter.send(event).await;
                "error"
            }
        };

        metrics::record_duration(
            &self.state.metrics.stream_duration,
            self.started,
            &[
                KeyValue::new("model", self.state.model.clone()),
                KeyValue::new("outcome", outcome),
            ],
        );

        tracing::debug!(
            outcome,
            tool_rounds = self.tool_rounds,
            prompt_tokens = self.usage.prompt_tokens,
            completion_tokens = self.usage.completion_tokens,
            "chat stream finished"
        );
    }

    async fn run(&mut self, mut upstream: EventStream, emitter: &Emitter) -> Result<(), RunError> {
        emitter
            .send(UiStreamEvent::Start { message_id: new_id() })
            .await?;

        loop {
            emitter.send(UiStreamEvent::StartStep).await?;
            let round = self.stream_round(&mut upstream, emitter).await?;
            emitter.send(UiStreamEvent::FinishStep).await?;

            let calls = round.tool_calls.finish();

            if calls.is_empty() {
                if round.finish_reason == Some(FinishReason::ToolCalls) {
                    tracing::warn!("model finished with tool_calls but sent no usable call");
                }
                break;
            }

            let Some(tools) = self.state.tools.clone() else {
                tracing::warn!(count = calls.len(), "ignoring tool calls, no tools are configured");
                break;
            };

            if self.tool_rounds >= self.state.max_tool_rounds {
                tracing::warn!(
                    count = calls.len(),
                    max_tool_rounds = self.state.max_tool_rounds,
                    "ignoring tool calls, round budget exhausted"
                );
                break;
            }

            self.tool_rounds += 1;
            self.execute_tools(tools.as_ref(), round.text, calls, emitter).await?;

            // The final round gets no tools so the model has to answer
            if self.tool_rounds >= self.state.max_tool_rounds {
                self.request.tools = None;
                self.request.tool_choice = None;
            }

            upstream = self.open_round().await?;
        }

        emitter.send(UiStreamEvent::Finish).await
    }

    /// Forward one upstream round, always closing an opened text block
    async fn stream_round(&mut self, upstream: &mut EventStream, emitter: &Emitter) -> Result<Round, RunError> {
        let mut round = Round::default();
        let result = self.read_round(upstream, emitter, &mut round).await;

        if let Some(id) = round.text_id.take() {
            emitter.send(UiStreamEvent::TextEnd { id }).await?;
        }

        result.map(|()| round)
    }

    async fn read_round(
        &mut self,
        upstream: &mut EventStream,
        emitter: &Emitter,
        round: &mut Round,
    ) -> Result<(), RunError> {
        while let Some(event) = upstream.next().await {
            match event? {
                StreamEvent::Delta(delta) => {
                    if let Some(content) = delta.content {
                        let id = if let Some(id) = &round.text_id {
                            id.clone()
                        } else {
                            let id = new_id();
                            emitter.send(UiStreamEvent::TextStart { id: id.clone() }).await?;
                            round.text_id = Some(id.clone());
                            id
                        };

                        if !content.is_empty() {
                            self.record_first_token();
                            round.text.push_str(&content);
                            emitter.send(UiStreamEvent::TextDelta { id, delta: content }).await?;
                        }
                    }

                    for call in &delta.tool_calls {
                        round.tool_calls.push(call);
                    }

                    if delta.finish_reason.is_some() {
                        round.finish_reason = delta.finish_reason;
                    }
                }
                StreamEvent::Usage(usage) => self.usage += usage,
                StreamEvent::Done => break,
            }
        }

        Ok(())
    }

    fn record_first_token(&mut self) {
        if self.first_token_seen {
            return;
        }

        self.first_token_seen = true;
        metrics::record_duration(
            &self.state.metrics.time_to_first_token,
            self.started,
            &[KeyValue::new("model", self.state.model.clone())],
        );
    }

    /// Execute all calls concurrently and append the exchange to the conversation
    async fn execute_tools(
        &mut self,
        tools: &dyn ToolExecutor,
        text: String,
        calls: Vec<ToolCall>,
        emitter: &Emitter,
    ) -> Result<(), RunError> {
        tracing::info!(count = calls.len(), round = self.tool_rounds, "executing tool calls");

        self.state.metrics.tool_calls.add(
            calls.len() as u64,
            &[KeyValue::new("model", self.state.model.clone())],
        );

        let outputs = join_all(calls.iter().map(|call| tools.execute(call))).await;

        if self.state.emit_sources {
            for source in outputs.iter().flat_map(|output| &output.sources) {
                if !self.sent_sources.insert(source.url.clone()) {
                    continue;
                }

                emitter
                    .send(UiStreamEvent::SourceUrl {
                        source_id: new_id(),
                        url: source.url.clone(),
                        title: source.title.clone(),
                    })
                    .await?;
            }
        }

        let results: Vec<Message> = calls
            .iter()
            .zip(outputs)
            .map(|(call, output)| Message::tool_result(&call.id, output.content))
            .collect();

        self.request
            .messages
            .push(Message::assistant_tool_calls(Some(text), calls));
        self.request.messages.extend(results);

        Ok(())
    }
}
