//! Fantasy data endpoints under `/v1`.

use axum::{Json, extract::State};
use huddle_config::{Favorite, league_key_from_team_key};
use huddle_yahoo::{
    DEFAULT_FREE_AGENT_LIMIT, DEFAULT_RECOMMENDATIONS, FreeAgents, LeagueSummary,
    MAX_FREE_AGENT_LIMIT, Roster, RosterAnalysis, Waivers, enrich_favorites, normalize_positions,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, Result};
use crate::extract::{FieldErrors, QueryParams, ValidQuery};
use crate::state::AppState;

/// Leagues visible to the authorized Yahoo account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamsResponse {
    pub leagues: Vec<LeagueSummary>,
}

/// Configured favorites with display names where known.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoritesResponse {
    pub favorites: Vec<Favorite>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TeamsQuery {
    pub nfl_season: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RosterQuery {
    pub team_key: Option<String>,
    pub week: Option<u32>,
}

/// `positions` is repeatable and read through [`QueryParams`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FreeAgentsQuery {
    pub team_key: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RosterAnalysisQuery {
    pub team_key: Option<String>,
    pub per_position: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WaiversQuery {
    pub team_key: Option<String>,
    pub league_key: Option<String>,
}

/// List the user's NFL leagues and their teams.
#[utoipa::path(
    get,
    path = "/v1/teams",
    params(("nfl_season" = Option<i32>, Query, description = "Season year, 2000-2100")),
    responses(
        (status = 200, description = "Leagues and teams", body = TeamsResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 503, description = "Adapter unavailable or reauthorization required", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "fantasy"
)]
pub async fn teams_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<TeamsQuery>,
) -> Result<Json<TeamsResponse>> {
    let mut errors = FieldErrors::default();
    let season = errors.in_range("nfl_season", query.nfl_season, 2000..=2100);
    errors.finish()?;

    let leagues = state.provider()?.list_teams(season).await?;
    Ok(Json(TeamsResponse { leagues }))
}

/// A team's roster, optionally for a given week.
#[utoipa::path(
    get,
    path = "/v1/roster",
    params(
        ("team_key" = String, Query, description = "Team key, e.g. 423.l.12345.t.7"),
        ("week" = Option<u32>, Query, description = "Week 1-18"),
    ),
    responses(
        (status = 200, description = "Roster", body = Roster),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "fantasy"
)]
pub async fn roster_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<RosterQuery>,
) -> Result<Json<Roster>> {
    let mut errors = FieldErrors::default();
    let team_key = errors.team_key("team_key", query.team_key.as_deref(), true);
    let week = errors.in_range("week", query.week, 1..=18);
    errors.finish()?;
    let team_key = team_key.unwrap_or_default();

    let roster = state.provider()?.get_roster(&team_key, week).await?;
    Ok(Json(roster))
}

/// Available players per position in the team's league.
#[utoipa::path(
    get,
    path = "/v1/free-agents",
    params(
        ("team_key" = String, Query, description = "Team key"),
        ("positions" = Option<Vec<String>>, Query, description = "Repeatable or comma separated; default QB,RB,WR,TE"),
        ("limit" = Option<u32>, Query, description = "Players per position, 1-50 (default 25)"),
    ),
    responses(
        (status = 200, description = "Free agents by position", body = FreeAgents),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "fantasy"
)]
pub async fn free_agents_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<FreeAgentsQuery>,
    params: QueryParams,
) -> Result<Json<FreeAgents>> {
    let mut errors = FieldErrors::default();
    let team_key = errors.team_key("team_key", query.team_key.as_deref(), true);
    let limit = errors.in_range("limit", query.limit, 1..=MAX_FREE_AGENT_LIMIT);
    errors.finish()?;
    let team_key = team_key.unwrap_or_default();
    let positions = normalize_positions(&params.all("positions"));

    let free_agents = state
        .provider()?
        .get_free_agents(
            &team_key,
            &positions,
            limit.unwrap_or(DEFAULT_FREE_AGENT_LIMIT),
        )
        .await?;
    Ok(Json(free_agents))
}

/// Roster plus the best available pickups per position.
#[utoipa::path(
    get,
    path = "/v1/roster-analysis",
    params(
        ("team_key" = String, Query, description = "Team key"),
        ("positions" = Option<Vec<String>>, Query, description = "Repeatable or comma separated; default QB,RB,WR,TE"),
        ("per_position" = Option<u32>, Query, description = "Recommendations per position, 1-50 (default 5)"),
    ),
    responses(
        (status = 200, description = "Roster analysis", body = RosterAnalysis),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "fantasy"
)]
pub async fn roster_analysis_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<RosterAnalysisQuery>,
    params: QueryParams,
) -> Result<Json<RosterAnalysis>> {
    let mut errors = FieldErrors::default();
    let team_key = errors.team_key("team_key", query.team_key.as_deref(), true);
    let per_position = errors.in_range("per_position", query.per_position, 1..=MAX_FREE_AGENT_LIMIT);
    errors.finish()?;
    let team_key = team_key.unwrap_or_default();
    let positions = normalize_positions(&params.all("positions"));

    let analysis = state
        .provider()?
        .get_roster_analysis(
            &team_key,
            &positions,
            per_position.unwrap_or(DEFAULT_RECOMMENDATIONS),
        )
        .await?;
    Ok(Json(analysis))
}

/// Waiver settings, priority, and the team's pending claims.
#[utoipa::path(
    get,
    path = "/v1/waivers",
    params(
        ("team_key" = String, Query, description = "Team key"),
        ("league_key" = Option<String>, Query, description = "Derived from team_key when omitted"),
    ),
    responses(
        (status = 200, description = "Waiver state", body = Waivers),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 422, description = "Invalid parameters", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 502, description = "Yahoo request failed", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "fantasy"
)]
pub async fn waivers_handler(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<WaiversQuery>,
) -> Result<Json<Waivers>> {
    let mut errors = FieldErrors::default();
    let team_key = errors.team_key("team_key", query.team_key.as_deref(), true);
    let league_key = errors.league_key("league_key", query.league_key.as_deref());
    errors.finish()?;
    let team_key = team_key.unwrap_or_default();
    let league_key = league_key
        .or_else(|| league_key_from_team_key(&team_key))
        .unwrap_or_default();

    let waivers = state
        .provider()?
        .get_waivers(&league_key, &team_key)
        .await?;
    Ok(Json(waivers))
}

/// Configured favorite teams, enriched with names when Yahoo is reachable.
#[utoipa::path(
    get,
    path = "/v1/favorites",
    responses(
        (status = 200, description = "Favorites", body = FavoritesResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    ),
    security(("api_key" = [])),
    tag = "fantasy"
)]
pub async fn favorites_handler(State(state): State<AppState>) -> Json<FavoritesResponse> {
    let configured = state.config.favorites.clone();
    let favorites = match state.provider.as_deref() {
        Some(provider) => enrich_favorites(provider, configured).await,
        None => configured,
    };
    Json(FavoritesResponse { favorites })
}
