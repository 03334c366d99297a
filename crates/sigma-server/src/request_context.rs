use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderValue;
use sigma_core::{REQUEST_ID_HEADER, RequestContext};

/// Middleware that constructs a `RequestContext` from the incoming request
///
/// The request id is echoed on the response so browser-side errors can be
/// matched with server logs.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let context = RequestContext::from_headers(request.headers());
    let request_id = HeaderValue::from_str(&context.request_id).ok();

    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Some(request_id) = request_id {
        response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    }

    response
}
