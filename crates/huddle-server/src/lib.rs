//! HTTP facade for Huddle.
//!
//! Serves the fantasy endpoints under `/v1` plus a handful of unauthenticated
//! service routes. Every `/v1` request passes per-IP rate limiting and then
//! the API-key check; every response carries an `X-Request-Id`.
//!
//! # Example
//!
//! ```ignore
//! use huddle_server::{AppState, Server, ServerConfig};
//!
//! let config = ServerConfig::new(Some("secret".to_string()))
//!     .with_bind_address("127.0.0.1:8000".parse()?);
//! let state = AppState::new(config, session).with_provider(provider);
//! Server::new(state).run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod ratelimit;
pub mod request;
pub mod routes;
pub mod state;

pub use auth::{API_KEY_HEADER, api_key_middleware};
pub use config::ServerConfig;
pub use error::{ErrorResponse, FieldError, Result, ServerError};
pub use metrics::Metrics;
pub use ratelimit::{create_keyed_limiter, rate_limit_middleware};
pub use request::{REQUEST_ID_HEADER, RequestId, request_context_middleware};
pub use routes::ApiDoc;
pub use state::AppState;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// How often idle rate-limit buckets are dropped.
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// The Huddle HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::openapi_routes())
            .merge(self.metrics_routes())
            .nest("/v1", self.api_routes())
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer())
            // Outermost so rejected and unmatched requests get an id too
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                request_context_middleware,
            ))
            .with_state(self.state.clone())
    }

    fn metrics_routes(&self) -> Router<AppState> {
        Router::new()
            .route("/metrics", get(routes::metrics_handler))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                api_key_middleware,
            ))
    }

    /// `/v1` routes. Rate limiting runs before the key check so that
    /// unauthenticated floods are throttled as well.
    fn api_routes(&self) -> Router<AppState> {
        Router::new()
            .route("/teams", get(routes::teams_handler))
            .route("/roster", get(routes::roster_handler))
            .route("/free-agents", get(routes::free_agents_handler))
            .route("/roster-analysis", get(routes::roster_analysis_handler))
            .route("/waivers", get(routes::waivers_handler))
            .route("/favorites", get(routes::favorites_handler))
            .route("/auth/url", get(routes::auth_url_handler))
            .route("/auth/token", post(routes::auth_token_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                api_key_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                rate_limit_middleware,
            ))
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins = &self.state.config.cors_origins;
        let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(
                origins
                    .iter()
                    .filter_map(|origin| HeaderValue::from_str(origin).ok()),
            )
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([REQUEST_ID_HEADER.clone()])
    }

    /// Run the server on the configured address until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;
        info!(address = %addr, "Starting server");

        let limiter = self.state.rate_limiter.clone();
        let sweeper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.retain_recent();
                limiter.shrink_to_fit();
            }
        });

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Internal(format!("Server error: {}", e)));

        sweeper.abort();
        info!("Server stopped");
        result
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use huddle_oauth::{OAuthConfig, SessionManager, TokenStore};
    use huddle_yahoo::{
        AvailablePlayer, FantasyProvider, FreeAgents, LeagueSummary, Player, Result, Roster,
        Team, WaiverClaim, WaiverPriorityItem, WaiverSettings, Waivers,
    };
    use tempfile::TempDir;

    /// Session backed by a credential file in a fresh temp dir. Keep the
    /// `TempDir` alive for as long as the file is needed.
    pub fn session_manager() -> (SessionManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("oauth2.json"));
        let session = SessionManager::new(store, OAuthConfig::yahoo()).with_consumer(
            Some("client-id".to_string()),
            Some("client-secret".to_string()),
        );
        (session, dir)
    }

    fn available(name: &str, position: &str) -> AvailablePlayer {
        AvailablePlayer {
            player_id: None,
            name: name.to_string(),
            eligible_positions: vec![position.to_string()],
            percent_owned: Some(10.0),
            status: None,
            position_type: Some("O".to_string()),
        }
    }

    /// Canned data for one league, `423.l.12345`, with team 7.
    pub struct FakeProvider;

    #[async_trait]
    impl FantasyProvider for FakeProvider {
        async fn list_teams(&self, _season: Option<i32>) -> Result<Vec<LeagueSummary>> {
            Ok(vec![LeagueSummary {
                league_id: "12345".into(),
                league_key: "423.l.12345".into(),
                league_name: Some("League 12345".into()),
                teams: vec![Team {
                    team_key: "423.l.12345.t.7".into(),
                    team_name: "Team Seven".into(),
                    waiver_priority: Some(3),
                }],
            }])
        }

        async fn get_roster(&self, team_key: &str, week: Option<u32>) -> Result<Roster> {
            Ok(Roster {
                team_key: team_key.to_string(),
                week,
                players: vec![Player {
                    name: "Patrick Mahomes".into(),
                    position: Some("QB".into()),
                    slot: Some("QB".into()),
                    status: None,
                    eligible_positions: vec!["QB".into()],
                    player_id: Some(30123),
                    position_type: Some("O".into()),
                }],
            })
        }

        async fn get_free_agents(
            &self,
            team_key: &str,
            positions: &[String],
            limit: u32,
        ) -> Result<FreeAgents> {
            let free_agents: BTreeMap<_, _> = positions
                .iter()
                .map(|position| {
                    let players = (1..=limit.min(8))
                        .map(|n| available(&format!("{position} {n}"), position))
                        .collect();
                    (position.clone(), players)
                })
                .collect();
            Ok(FreeAgents {
                team_key: team_key.to_string(),
                positions: positions.to_vec(),
                free_agents,
            })
        }

        async fn get_waivers(&self, league_key: &str, team_key: &str) -> Result<Waivers> {
            Ok(Waivers {
                settings: WaiverSettings {
                    waiver_type: Some(format!("league {league_key}")),
                    ..WaiverSettings::default()
                },
                priority: vec![WaiverPriorityItem {
                    team_name: "Team Seven".into(),
                    team_key: team_key.to_string(),
                    priority: Some(3),
                }],
                pending: vec![WaiverClaim {
                    player: "Some Rookie".into(),
                    action_type: "add".into(),
                    source_team_key: None,
                    destination_team_key: Some(team_key.to_string()),
                    faab_bid: None,
                }],
            })
        }
    }
}
