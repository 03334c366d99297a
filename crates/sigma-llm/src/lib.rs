//! Chat completions for Sigma
//!
//! Normalizes browser chat messages, streams completions from an
//! OpenAI-compatible provider, runs the web search tool loop and encodes the
//! result as a UI message stream.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
#[cfg(feature = "http")]
mod handler;
pub mod orchestrator;
pub mod protocol;
pub mod provider;
mod state;
pub mod tools;
pub mod types;
pub mod ui;
pub mod ui_stream;

pub use error::LlmError;
#[cfg(feature = "http")]
pub use handler::chat_router;
pub use orchestrator::UiEventStream;
pub use provider::{EventStream, Provider};
pub use state::ChatState;
pub use tools::{SearchToolExecutor, ToolExecutor};
pub use types::{CompletionRequest, Message, StreamEvent};
pub use ui::{ChatRequest, normalize_messages};
pub use ui_stream::UiStreamEvent;
