//! API routes.

pub mod auth;
pub mod fantasy;
pub mod health;
pub mod metrics;
pub mod openapi;

pub use auth::{
    AuthCodeRequest, AuthCodeResponse, AuthUrlResponse, auth_token_handler, auth_url_handler,
};
pub use fantasy::{
    FavoritesResponse, TeamsResponse, favorites_handler, free_agents_handler,
    roster_analysis_handler, roster_handler, teams_handler, waivers_handler,
};
pub use health::health_routes;
pub use metrics::metrics_handler;
pub use openapi::{ApiDoc, openapi_routes};
