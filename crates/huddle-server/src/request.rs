//! Request ids and per-request logging.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::state::AppState;

/// Header echoed (or generated) on every response.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request id, available to handlers through request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn inbound_request_id(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Tag the request with an id, stamp it on the response, count the response,
/// and emit one structured log line.
///
/// Installed outermost so rejected requests (401, 429, 422) are covered too.
pub async fn request_context_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = inbound_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let mut response = next.run(request).await;

    let latency_ms = (start.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;
    let status = response.status();
    state.metrics.record_response(status);

    match HeaderValue::from_str(&request_id) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), value);
        }
        Err(_) => tracing::debug!("request id is not a valid header value"),
    }

    if state.config.request_logging {
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms,
                "request"
            );
        } else if status.is_client_error() {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms,
                "request"
            );
        } else {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms,
                "request"
            );
        }
    }

    response
}
