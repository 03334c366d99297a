//! Events of the UI message stream consumed by the chat frontend
//!
//! Each event is sent as one SSE `data:` line holding its JSON encoding, and
//! the stream ends with a literal `[DONE]` line.

use serde::Serialize;

/// Response header announcing the UI message stream protocol
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

/// Protocol version carried by [`UI_MESSAGE_STREAM_HEADER`]
pub const UI_MESSAGE_STREAM_VERSION: &str = "v1";

/// Terminal data line of the stream
pub const DONE_MARKER: &str = "[DONE]";

/// One event of the UI message stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum UiStreamEvent {
    /// Assistant message begins
    Start { message_id: String },
    /// A model round begins
    StartStep,
    /// A text block opens
    TextStart { id: String },
    /// Text appended to the open block
    TextDelta { id: String, delta: String },
    /// The text block closes
    TextEnd { id: String },
    /// A web page consulted while answering
    SourceUrl {
        source_id: String,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// The model round ended
    FinishStep,
    /// Assistant message complete
    Finish,
    /// The response failed after it started
    Error { error_text: String },
}

/// Fresh identifier for messages, text blocks and sources
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(event: &UiStreamEvent) -> String {
        serde_json::to_string(event).unwrap()
    }

    #[test]
    fn events_use_ui_stream_field_names() {
        assert_eq!(
            json(&UiStreamEvent::Start {
                message_id: "m1".to_owned()
            }),
            r#"{"type":"start","messageId":"m1"}"#
        );
        assert_eq!(json(&UiStreamEvent::StartStep), r#"{"type":"start-step"}"#);
        assert_eq!(
            json(&UiStreamEvent::TextDelta {
                id: "t1".to_owned(),
                delta: "Hi".to_owned()
            }),
            r#"{"type":"text-delta","id":"t1","delta":"Hi"}"#
        );
        assert_eq!(
            json(&UiStreamEvent::SourceUrl {
                source_id: "s1".to_owned(),
                url: "https://example.com".to_owned(),
                title: None,
            }),
            r#"{"type":"source-url","sourceId":"s1","url":"https://example.com"}"#
        );
        assert_eq!(json(&UiStreamEvent::Finish), r#"{"type":"finish"}"#);
        assert_eq!(
            json(&UiStreamEvent::Error {
                error_text: "boom".to_owned()
            }),
            r#"{"type":"error","errorText":"boom"}"#
        );
    }

    #[test]
    fn ids_are_simple_uuids() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
        assert_ne!(id, new_id());
    }
}
