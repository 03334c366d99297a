//! Conversion between internal types and `OpenAI` wire format

use crate::protocol::openai::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest, OpenAiStreamChoice, OpenAiStreamChunk,
    OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::types::{
    CompletionRequest, FinishReason, Message, StreamDelta, StreamEvent, StreamFunctionCall, StreamToolCall, Usage,
};

// -- Outbound: internal request -> OpenAI wire request --

impl From<&CompletionRequest> for OpenAiRequest {
    fn from(req: &CompletionRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            temperature: req.params.temperature,
            max_tokens: req.params.max_tokens,
            stream: None,
            tools: req.tools.as_ref().map(|tools| {
                tools
                    .iter()
                    .map(|t| OpenAiTool {
                        tool_type: t.tool_type.clone(),
                        function: OpenAiFunction {
                            name: t.function.name.clone(),
                            description: t.function.description.clone(),
                            parameters: t.function.parameters.clone(),
                        },
                    })
                    .collect()
            }),
            tool_choice: req.tool_choice.map(|choice| choice.as_str().to_owned()),
            stream_options: None,
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let tool_calls = msg.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|tc| OpenAiToolCall {
                    id: tc.id.clone(),
                    tool_type: "function".to_owned(),
                    function: OpenAiFunctionCall {
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    },
                })
                .collect()
        });

        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

impl From<&OpenAiUsage> for Usage {
    fn from(usage: &OpenAiUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

// -- Stream conversion --

/// Convert an `OpenAI` stream chunk into internal stream events
pub fn openai_chunk_to_events(chunk: &OpenAiStreamChunk) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = chunk
        .choices
        .iter()
        .map(|choice| StreamEvent::Delta(openai_stream_choice_to_delta(choice)))
        .collect();

    let usage = chunk
        .usage
        .as_ref()
        .or_else(|| chunk.x_groq.as_ref().and_then(|x| x.usage.as_ref()));

    if let Some(usage) = usage {
        events.push(StreamEvent::Usage(usage.into()));
    }

    events
}

/// Convert an `OpenAI` stream choice to an internal stream delta
fn openai_stream_choice_to_delta(choice: &OpenAiStreamChoice) -> StreamDelta {
    let tool_calls = choice
        .delta
        .tool_calls
        .iter()
        .flatten()
        .map(|tc| StreamToolCall {
            index: tc.index,
            id: tc.id.clone(),
            function: tc.function.as_ref().map(|f| StreamFunctionCall {
                name: f.name.clone(),
                arguments: f.arguments.clone(),
            }),
        })
        .collect();

    StreamDelta {
        index: choice.index,
        content: choice.delta.content.clone(),
        tool_calls,
        finish_reason: choice.finish_reason.as_deref().and_then(FinishReason::parse),
    }
}
