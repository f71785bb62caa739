//! OAuth bootstrap endpoints under `/v1/auth`.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use huddle_oauth::{AuthorizationUrl, ExchangeOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, FieldError, Result, ServerError};
use crate::extract::{ValidJson, ValidQuery};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthUrlResponse {
    pub authorization_url: String,
    pub redirect_uri: String,
    pub state: Option<String>,
}

impl From<AuthorizationUrl> for AuthUrlResponse {
    fn from(url: AuthorizationUrl) -> Self {
        Self {
            authorization_url: url.authorization_url,
            redirect_uri: url.redirect_uri,
            state: url.state,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthCodeRequest {
    /// Code shown to the user after granting access.
    pub code: String,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthCodeResponse {
    pub status: String,
    pub token_type: Option<String>,
    pub guid: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ExchangeOutcome> for AuthCodeResponse {
    fn from(outcome: ExchangeOutcome) -> Self {
        Self {
            status: outcome.status,
            token_type: outcome.token_type,
            guid: outcome.guid,
            scope: outcome.scope,
            expires_at: outcome.expires_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthUrlQuery {
    pub state: Option<String>,
    pub redirect_uri: Option<String>,
}

/// URL the user visits to grant this service access to Yahoo.
#[utoipa::path(
    get,
    path = "/v1/auth/url",
    params(
        ("state" = Option<String>, Query, description = "Opaque value echoed back by Yahoo"),
        ("redirect_uri" = Option<String>, Query, description = "Overrides the configured redirect URI"),
    ),
    responses(
        (status = 200, description = "Authorization URL", body = AuthUrlResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 500, description = "Consumer credentials not configured", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "auth"
)]
pub async fn auth_url_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<AuthUrlQuery>,
) -> Result<Json<AuthUrlResponse>> {
    let url = state
        .oauth
        .authorization_url(query.state.as_deref(), query.redirect_uri.as_deref())?;
    Ok(Json(url.into()))
}

/// Exchange an authorization code and store the resulting tokens.
#[utoipa::path(
    post,
    path = "/v1/auth/token",
    request_body = AuthCodeRequest,
    responses(
        (status = 200, description = "Tokens stored", body = AuthCodeResponse),
        (status = 400, description = "Blank or rejected code", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 422, description = "Invalid body", body = ErrorResponse),
        (status = 502, description = "Yahoo unreachable or returned an invalid response", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "auth"
)]
pub async fn auth_token_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<AuthCodeRequest>,
) -> Result<Json<AuthCodeResponse>> {
    if request.code.is_empty() {
        return Err(ServerError::Validation(vec![FieldError::new(
            "code",
            "String should have at least 1 character",
        )]));
    }

    let outcome = state
        .oauth
        .exchange_code(
            &request.code,
            request.redirect_uri.as_deref(),
            request.state.as_deref(),
        )
        .await?;
    Ok(Json(outcome.into()))
}
