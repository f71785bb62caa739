//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use huddle_oauth::OAuthError;
use huddle_yahoo::YahooError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or wrong API key.
    #[error("{0}")]
    Unauthorized(String),

    /// Request parameters or body failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Per-IP rate limit exceeded.
    #[error("Too many requests")]
    RateLimited,

    /// OAuth exchange or credential failure.
    #[error("{0}")]
    OAuth(OAuthError),

    /// Stored grant is unusable; an operator must re-run the authorization flow.
    #[error("{0}")]
    ReauthorizationRequired(String),

    /// The upstream adapter is disabled in this deployment.
    #[error("Upstream adapter is not available")]
    AdapterUnavailable,

    /// Yahoo failed or returned something unusable.
    #[error("{0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OAuthError> for ServerError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::ReauthorizationRequired(msg) => ServerError::ReauthorizationRequired(msg),
            other => ServerError::OAuth(other),
        }
    }
}

impl From<YahooError> for ServerError {
    fn from(e: YahooError) -> Self {
        match e {
            YahooError::OAuth(inner) => inner.into(),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field problems for `validation_error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ServerError {
    /// HTTP status and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ServerError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            ServerError::OAuth(e) => (
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY),
                "oauth_error",
            ),
            ServerError::ReauthorizationRequired(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "reauthorization_required")
            }
            ServerError::AdapterUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "adapter_unavailable")
            }
            ServerError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let details = match self {
            ServerError::Validation(fields) => Some(fields),
            _ => None,
        };
        let body = ErrorResponse {
            code: code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
