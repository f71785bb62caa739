//! Server configuration.

use std::net::SocketAddr;

use huddle_config::{Favorite, Settings};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Expected `X-API-Key` value. `None` disables API-key auth.
    pub api_key: Option<String>,

    /// Enable per-IP rate limiting on `/v1`.
    pub rate_limiting: bool,

    /// Steady requests per minute per client IP.
    pub rate_limit_per_min: u32,

    /// Extra requests a client may burst above the steady rate.
    pub rate_limit_burst: u32,

    /// Enable the per-request log line.
    pub request_logging: bool,

    /// CORS allowed origins; `*` allows any.
    pub cors_origins: Vec<String>,

    /// Favorites served by `/v1/favorites`.
    pub favorites: Vec<Favorite>,

    /// Build commit reported by `/version`.
    pub git_sha: String,

    /// Build time reported by `/version`.
    pub build_time: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], huddle_config::settings::DEFAULT_PORT)),
            api_key: None,
            rate_limiting: true,
            rate_limit_per_min: huddle_config::settings::DEFAULT_RATE_LIMIT_PER_MIN,
            rate_limit_burst: huddle_config::settings::DEFAULT_RATE_LIMIT_BURST,
            request_logging: true,
            cors_origins: vec!["*".to_string()],
            favorites: Vec::new(),
            git_sha: "dev".to_string(),
            build_time: "dev".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new server config with an optional API key.
    /// Pass `None` to disable authentication.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Default::default()
        }
    }

    /// Derive the server config from process settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], settings.port)),
            api_key: settings.api_key.clone(),
            rate_limiting: true,
            rate_limit_per_min: settings.rate_limit_per_min,
            rate_limit_burst: settings.rate_limit_burst,
            request_logging: true,
            cors_origins: settings.cors_origins(),
            favorites: settings.favorite_teams(),
            git_sha: settings.git_sha.clone(),
            build_time: settings.build_time.clone(),
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable rate limiting.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Set the steady rate and burst allowance.
    pub fn with_rate_limit(mut self, per_min: u32, burst: u32) -> Self {
        self.rate_limit_per_min = per_min;
        self.rate_limit_burst = burst;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the configured favorites.
    pub fn with_favorites(mut self, favorites: Vec<Favorite>) -> Self {
        self.favorites = favorites;
        self
    }
}
