//! Rate limiting middleware using governor.
//!
//! Provides per-IP rate limiting for the `/v1` endpoints.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};

use crate::error::ServerError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Per-client limiter keyed by IP string.
pub type SharedKeyedLimiter = Arc<DefaultKeyedRateLimiter<String>>;

/// Key used when the peer address is not known.
pub const UNKNOWN_CLIENT: &str = "unknown";

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiter Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Create a keyed limiter that refills `per_min` cells a minute and lets a
/// client spend up to `per_min + burst` at once.
pub fn create_keyed_limiter(per_min: u32, burst: u32) -> SharedKeyedLimiter {
    let steady = NonZeroU32::new(per_min).unwrap_or(NonZeroU32::MIN);
    let capacity = NonZeroU32::new(steady.get().saturating_add(burst)).unwrap_or(steady);
    let quota = Quota::per_minute(steady).allow_burst(capacity);
    Arc::new(RateLimiter::keyed(quota))
}

/// Client identity for rate limiting: the socket peer IP.
pub fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Per-IP rate limiting middleware.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limiting {
        return next.run(request).await;
    }

    let client = client_key(&request);
    match state.rate_limiter.check_key(&client) {
        Ok(_) => next.run(request).await,
        Err(not_until) => {
            let retry_after = not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
                .max(1);
            state.metrics.record_rate_limited();

            tracing::warn!(
                client = %client,
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Rate limit exceeded"
            );

            let mut response = ServerError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
