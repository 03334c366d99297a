//! Axum route for the browser chat endpoint

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router, routing};
use futures_util::StreamExt;
use sigma_core::{HttpError, RequestContext};

use crate::error::LlmError;
use crate::orchestrator::UiEventStream;
use crate::state::ChatState;
use crate::ui::{ChatRequest, normalize_messages};
use crate::ui_stream::{DONE_MARKER, UI_MESSAGE_STREAM_HEADER, UI_MESSAGE_STREAM_VERSION};

/// Build the chat router
pub fn chat_router(state: ChatState) -> Router {
    Router::new()
        .route("/api/chat", routing::post(chat))
        .with_state(state)
}

/// Handle `POST /api/chat`
async fn chat(
    State(state): State<ChatState>,
    Extension(context): Extension<RequestContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "rejecting malformed chat request");
            return error_body(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let messages = match normalize_messages(state.system_prompt(), &request.messages) {
        Ok(messages) => messages,
        Err(e) => return error_response(&e),
    };

    tracing::debug!(
        request_id = %context.request_id,
        chat_id = request.id.as_deref().unwrap_or_default(),
        messages = messages.len(),
        "chat request"
    );

    match state.stream_chat(messages, context).await {
        Ok(stream) => ui_stream_response(stream),
        Err(e) => error_response(&e),
    }
}

/// Encode UI events as an SSE response in the UI message stream protocol
fn ui_stream_response(stream: UiEventStream) -> Response {
    let events = stream
        .map(|event| Event::default().json_data(event))
        .chain(futures_util::stream::once(async {
            Ok::<_, axum::Error>(Event::default().data(DONE_MARKER))
        }));

    (
        [
            (
                HeaderName::from_static(UI_MESSAGE_STREAM_HEADER),
                HeaderValue::from_static(UI_MESSAGE_STREAM_VERSION),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (HeaderName::from_static("x-accel-buffering"), HeaderValue::from_static("no")),
        ],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

fn error_response(error: &LlmError) -> Response {
    if error.status_code().is_server_error() {
        tracing::error!(error = %error, error_type = error.error_type(), "chat request failed");
    }

    error_body(error.status_code(), &error.client_message())
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
