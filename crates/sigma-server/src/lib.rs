//! HTTP server assembly for Sigma

mod cors;
mod health;
mod request_context;

use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use sigma_config::Config;
use sigma_llm::ChatState;
use sigma_search::SearchService;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the search, chat or image generation subsystem
    /// fails to initialize
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let search = SearchService::from_config(&config.search)
            .map_err(|e| anyhow::anyhow!("Failed to initialize web search: {e}"))?;
        let chat_state = ChatState::from_config(&config.chat, search)
            .map_err(|e| anyhow::anyhow!("Failed to initialize chat: {e}"))?;
        let imagegen_state = sigma_imagegen::build_server(&config.imagegen)?;

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // Chat routes
        app = app.merge(sigma_llm::chat_router(chat_state));

        // Image generation routes
        app = app.merge(sigma_imagegen::endpoint_router().with_state(imagegen_state));

        // Browser UI for everything else
        if let Some(dir) = &config.server.static_dir {
            app = app.fallback_service(static_files(dir));
        }

        // Apply middleware layers (innermost first)

        // Request context (innermost, runs just before handlers)
        app = app.layer(axum::middleware::from_fn(request_context::request_context_middleware));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Serve the exported UI, falling back to `index.html` for client-side routes
fn static_files(dir: &Path) -> ServeDir<ServeFile> {
    tracing::debug!(dir = %dir.display(), "serving static UI");
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    fn config(extra: &str) -> Config {
        format!("[chat.provider]\napi_key = \"gsk-test\"\n{extra}").parse().unwrap()
    }

    async fn get(router: Router, path: &str, request_id: Option<&str>) -> (StatusCode, http::HeaderMap, String) {
        let mut request = Request::get(path);
        if let Some(id) = request_id {
            request = request.header("x-request-id", id);
        }

        let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_echoes_request_id() {
        let router = Server::new(&config("")).unwrap().into_router();
        let (status, headers, body) = get(router, "/health", Some("req-42")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
        assert_eq!(headers["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn health_can_be_moved_or_disabled() {
        let router = Server::new(&config("[server.health]\npath = \"/healthz\"")).unwrap().into_router();
        assert_eq!(get(router, "/healthz", None).await.0, StatusCode::OK);

        let router = Server::new(&config("[server.health]\nenabled = false")).unwrap().into_router();
        assert_eq!(get(router, "/health", None).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn static_ui_is_served_with_spa_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>sigma</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let extra = format!("[server]\nstatic_dir = {:?}", dir.path().display().to_string());
        let router = Server::new(&config(&extra)).unwrap().into_router();

        let (status, _, body) = get(router.clone(), "/app.js", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1)");

        let (status, _, body) = get(router.clone(), "/chats/123", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html>sigma</html>");

        let (status, _, _) = get(router, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
