//! Browser chat payloads and their normalization into completion messages

use serde::Deserialize;

use crate::error::LlmError;
use crate::types::{Message, Role};

/// Body posted by the chat UI
///
/// Fields other than `messages` are accepted for compatibility with the
/// browser client but do not affect the completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<UiMessage>,
    /// Chat identifier assigned by the client
    #[serde(default)]
    pub id: Option<String>,
    /// What caused the client to send (`submit-message`, `regenerate-message`)
    #[serde(default)]
    pub trigger: Option<String>,
}

/// One message as the browser holds it
#[derive(Debug, Clone, Deserialize)]
pub struct UiMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    /// Structured parts; takes precedence over `content`
    #[serde(default)]
    pub parts: Option<Vec<UiMessagePart>>,
    /// Plain text content sent by older clients
    #[serde(default)]
    pub content: Option<String>,
}

/// A message part; only text parts contribute to the prompt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiMessagePart {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl UiMessage {
    /// Flattened text content
    pub fn text(&self) -> String {
        match (&self.parts, &self.content) {
            (Some(parts), _) => parts
                .iter()
                .filter_map(|part| match part {
                    UiMessagePart::Text { text } => Some(text.as_str()),
                    UiMessagePart::Other => None,
                })
                .collect(),
            (None, Some(content)) => content.clone(),
            (None, None) => String::new(),
        }
    }
}

fn parse_role(role: &str) -> Result<Role, LlmError> {
    match role {
        "system" => Ok(Role::System),
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        other => Err(LlmError::InvalidRequest(format!("unsupported message role: {other}"))),
    }
}

/// Convert browser messages into completion messages
///
/// `system_prompt` is placed first when non-empty. Messages without text are
/// dropped unless they are system messages.
pub fn normalize_messages(system_prompt: &str, messages: &[UiMessage]) -> Result<Vec<Message>, LlmError> {
    let mut normalized = Vec::with_capacity(messages.len() + 1);

    if !system_prompt.is_empty() {
        normalized.push(Message::system(system_prompt));
    }

    for message in messages {
        let role = parse_role(&message.role)?;
        let text = message.text();

        if text.is_empty() && role != Role::System {
            continue;
        }

        normalized.push(Message::text(role, text));
    }

    Ok(normalized)
}
