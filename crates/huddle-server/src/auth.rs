//! API-key authentication middleware.
//!
//! # Security
//!
//! Key comparison uses constant-time comparison to prevent timing attacks.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::ServerError;
use crate::state::AppState;

/// Header carrying the client's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const UNAUTHORIZED_MESSAGE: &str = "Missing or invalid API key";

/// Compare two strings in constant time.
///
/// Lengths are not secret here, but the byte comparison must not short-circuit.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}

/// Require `X-API-Key` to match the configured key. A no-op when no key is
/// configured.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(expected) = state.config().api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key, expected) => Ok(next.run(request).await),
        _ => Err(ServerError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())),
    }
}
