//! Mock upstream services for integration tests
//!
//! One server plays three roles: an OpenAI-compatible chat endpoint that
//! streams SSE, a Tavily-compatible `/search` endpoint, and the two image
//! generation APIs. Non-streaming `/chat/completions` requests are treated
//! as image generation.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// A 1x1 PNG, base64 encoded
pub const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Mock upstream that returns canned responses
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: String,
    tool_query: Option<String>,
    fail_chat: bool,
    fail_search: bool,
    image: bool,
    chat_requests: Mutex<Vec<Value>>,
    search_requests: Mutex<Vec<Value>>,
    image_requests: Mutex<Vec<Value>>,
}

/// Builder for [`MockUpstream`] behavior
pub struct MockUpstreamBuilder {
    reply: String,
    tool_query: Option<String>,
    fail_chat: bool,
    fail_search: bool,
    image: bool,
}

impl MockUpstream {
    pub fn builder() -> MockUpstreamBuilder {
        MockUpstreamBuilder {
            reply: "Hello from the mock".to_owned(),
            tool_query: None,
            fail_chat: false,
            fail_search: false,
            image: true,
        }
    }

    /// Start a mock with default behavior
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    /// Base URL for chat and image providers
    ///
    /// Includes `/v1` since providers append paths like `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Base URL for the search provider
    pub fn search_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Bodies of the streaming chat requests received so far
    pub fn chat_requests(&self) -> Vec<Value> {
        self.state.chat_requests.lock().unwrap().clone()
    }

    pub fn search_requests(&self) -> Vec<Value> {
        self.state.search_requests.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<Value> {
        self.state.image_requests.lock().unwrap().clone()
    }
}

impl MockUpstreamBuilder {
    /// Text streamed back for a plain answer
    pub fn reply(mut self, reply: &str) -> Self {
        reply.clone_into(&mut self.reply);
        self
    }

    /// Answer the first tool-enabled request with a `web_search` call
    pub fn tool_call(mut self, query: &str) -> Self {
        self.tool_query = Some(query.to_owned());
        self
    }

    /// Reject chat requests with 500
    pub fn failing_chat(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    /// Reject search requests with 500
    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Return image responses without any image
    pub fn without_image(mut self) -> Self {
        self.image = false;
        self
    }

    pub async fn start(self) -> anyhow::Result<MockUpstream> {
        let state = Arc::new(MockState {
            reply: self.reply,
            tool_query: self.tool_query,
            fail_chat: self.fail_chat,
            fail_search: self.fail_search,
            image: self.image,
            chat_requests: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
            image_requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/images/generations", routing::post(handle_images))
            .route("/search", routing::post(handle_search))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockUpstream { addr, shutdown, state })
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Handlers --

async fn handle_chat_completions(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["stream"] != true {
        return handle_chat_image(&state, body);
    }

    state.chat_requests.lock().unwrap().push(body.clone());

    if state.fail_chat {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": {"message": "mock server intentional failure", "type": "server_error"}
            })),
        )
            .into_response();
    }

    let has_tools = body["tools"].as_array().is_some_and(|tools| !tools.is_empty());
    let answered_tool = body["messages"]
        .as_array()
        .is_some_and(|messages| messages.iter().any(|m| m["role"] == "tool"));

    let chunks = match &state.tool_query {
        Some(query) if has_tools && !answered_tool => tool_call_chunks(query),
        _ => text_chunks(&state.reply),
    };

    let mut sse = String::new();
    for chunk in chunks {
        let _ = write!(sse, "data: {chunk}\n\n");
    }
    sse.push_str("data: [DONE]\n\n");

    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
}

fn chunk(delta: &Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "mock-chat",
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

fn usage_chunk() -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "mock-chat",
        "choices": [],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn text_chunks(reply: &str) -> Vec<Value> {
    let mut chunks = vec![chunk(&json!({"role": "assistant", "content": ""}), None)];

    // One chunk per word, keeping the separating spaces
    let words: Vec<&str> = reply.split(' ').collect();
    for (i, word) in words.iter().enumerate() {
        let content = if i + 1 < words.len() { format!("{word} ") } else { (*word).to_owned() };
        chunks.push(chunk(&json!({"content": content}), None));
    }

    chunks.push(chunk(&json!({}), Some("stop")));
    chunks.push(usage_chunk());
    chunks
}

fn tool_call_chunks(query: &str) -> Vec<Value> {
    let arguments = json!({"query": query}).to_string();
    let (head, tail) = arguments.split_at(arguments.len() / 2);

    vec![
        chunk(
            &json!({
                "role": "assistant",
                "tool_calls": [{
                    "index": 0,
                    "id": "call_mock_search",
                    "type": "function",
                    "function": {"name": "web_search", "arguments": ""}
                }]
            }),
            None,
        ),
        chunk(&json!({"tool_calls": [{"index": 0, "function": {"arguments": head}}]}), None),
        chunk(&json!({"tool_calls": [{"index": 0, "function": {"arguments": tail}}]}), None),
        chunk(&json!({}), Some("tool_calls")),
        usage_chunk(),
    ]
}

fn handle_chat_image(state: &MockState, body: Value) -> Response {
    state.image_requests.lock().unwrap().push(body);

    let images = if state.image {
        json!([{
            "type": "image_url",
            "image_url": {"url": format!("data:image/png;base64,{PIXEL_PNG}")}
        }])
    } else {
        json!([])
    };

    Json(json!({
        "id": "gen-mock",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "Here is your image.",
                "images": images
            },
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 1290, "total_tokens": 1302}
    }))
    .into_response()
}

async fn handle_images(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.image_requests.lock().unwrap().push(body);

    let data = if state.image {
        json!([{"b64_json": PIXEL_PNG}])
    } else {
        json!([])
    };

    Json(json!({
        "created": 1_700_000_000,
        "data": data,
        "usage": {"input_tokens": 20, "output_tokens": 4160, "total_tokens": 4180}
    }))
    .into_response()
}

async fn handle_search(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.search_requests.lock().unwrap().push(body.clone());

    if state.fail_search {
        return (StatusCode::INTERNAL_SERVER_ERROR, "search backend down").into_response();
    }

    Json(json!({
        "query": body["query"],
        "answer": "Rust 1.90 was released in September.",
        "results": [
            {"title": "Rust Blog", "url": "https://blog.rust-lang.org/", "content": "Announcing Rust 1.90", "score": 0.93},
            {"title": "Release notes", "url": "https://doc.rust-lang.org/releases.html", "content": "Version 1.90.0", "score": 0.81},
            {"title": "Rust Blog (mirror)", "url": "https://blog.rust-lang.org/", "content": "Announcing Rust 1.90", "score": 0.5}
        ]
    }))
    .into_response()
}
