use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness probe; answers without touching any upstream
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
