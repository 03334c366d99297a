//! Test server wrapper that starts Sigma on a random port

use std::net::SocketAddr;

use sigma_config::Config;
use sigma_server::Server;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(&config)?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    /// Absolute URL for a path on the running server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Post a single user message to `/api/chat`
    pub async fn chat(&self, text: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chat"))
            .json(&serde_json::json!({
                "id": "chat-1",
                "messages": [{
                    "id": "msg-1",
                    "role": "user",
                    "parts": [{"type": "text", "text": text}]
                }]
            }))
            .send()
            .await
            .unwrap()
    }

    /// Post a JSON body to `/api/generate-image`
    pub async fn generate_image(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/generate-image"))
            .json(body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
