//! Unauthenticated service endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::get,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
}

/// Build information.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub git_sha: String,
    pub build_time: String,
}

const PRIVACY_POLICY: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Privacy Policy</title></head>
<body>
<h1>Privacy Policy</h1>
<p>This service reads your Yahoo Fantasy Sports leagues, teams, rosters and
transactions on your behalf in order to answer API requests.</p>
<p>OAuth tokens are stored only on the server that runs this service and are
used only to call the Yahoo Fantasy Sports API. No fantasy data is stored
beyond the lifetime of a request, and nothing is shared with third parties.</p>
<p>Request logs contain the request path, status and a request id. They do not
contain tokens or API keys.</p>
</body>
</html>
"#;

/// Simple health check (no auth required).
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Build commit and time.
#[utoipa::path(
    get,
    path = "/version",
    responses(
        (status = 200, description = "Build information", body = VersionResponse),
    ),
    tag = "health"
)]
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        git_sha: state.config.git_sha.clone(),
        build_time: state.config.build_time.clone(),
    })
}

/// Static privacy policy page.
#[utoipa::path(
    get,
    path = "/privacy-policy",
    responses(
        (status = 200, description = "Privacy policy", content_type = "text/html", body = String),
    ),
    tag = "health"
)]
pub async fn privacy_policy() -> Html<&'static str> {
    Html(PRIVACY_POLICY)
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/privacy-policy", get(privacy_policy))
}
