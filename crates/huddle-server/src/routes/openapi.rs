//! OpenAPI document served at `/openapi.json`.

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

use super::{auth, fantasy, health, metrics};
use crate::state::AppState;

/// OpenAPI documentation for the Huddle API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Huddle API",
        description = "Yahoo Fantasy Football proxy",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        // Service
        health::health,
        health::version,
        health::privacy_policy,
        metrics::metrics_handler,
        // Fantasy
        fantasy::teams_handler,
        fantasy::roster_handler,
        fantasy::free_agents_handler,
        fantasy::roster_analysis_handler,
        fantasy::waivers_handler,
        fantasy::favorites_handler,
        // Auth
        auth::auth_url_handler,
        auth::auth_token_handler,
    ),
    components(schemas(
        health::HealthResponse,
        health::VersionResponse,
        fantasy::TeamsResponse,
        fantasy::FavoritesResponse,
        auth::AuthUrlResponse,
        auth::AuthCodeRequest,
        auth::AuthCodeResponse,
        crate::error::ErrorResponse,
        crate::error::FieldError,
        huddle_config::Favorite,
        huddle_yahoo::Team,
        huddle_yahoo::LeagueSummary,
        huddle_yahoo::Player,
        huddle_yahoo::Roster,
        huddle_yahoo::AvailablePlayer,
        huddle_yahoo::FreeAgents,
        huddle_yahoo::RosterAnalysis,
        huddle_yahoo::WaiverSettings,
        huddle_yahoo::WaiverPriorityItem,
        huddle_yahoo::WaiverClaim,
        huddle_yahoo::Waivers,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service status"),
        (name = "fantasy", description = "Leagues, rosters, free agents and waivers"),
        (name = "auth", description = "Yahoo OAuth bootstrap"),
    )
)]
pub struct ApiDoc;

/// Add the `X-API-Key` header scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Route serving the generated document.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}
