//! Application state shared across handlers.

use std::sync::Arc;

use huddle_oauth::SessionManager;
use huddle_yahoo::{FantasyProvider, SharedProvider};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::metrics::Metrics;
use crate::ratelimit::{SharedKeyedLimiter, create_keyed_limiter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// OAuth session used by the `/v1/auth` routes.
    pub oauth: Arc<SessionManager>,

    /// Upstream adapter (None when the adapter is disabled).
    pub provider: Option<SharedProvider>,

    /// Per-IP limiter for `/v1`.
    pub rate_limiter: SharedKeyedLimiter,

    /// Request counters for `/metrics`.
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new application state with no upstream adapter.
    pub fn new(config: ServerConfig, oauth: SessionManager) -> Self {
        let rate_limiter = create_keyed_limiter(config.rate_limit_per_min, config.rate_limit_burst);
        Self {
            config: Arc::new(config),
            oauth: Arc::new(oauth),
            provider: None,
            rate_limiter,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Attach the upstream adapter.
    pub fn with_provider(mut self, provider: Arc<dyn FantasyProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The upstream adapter, or `adapter_unavailable` when it is disabled.
    pub fn provider(&self) -> Result<&dyn FantasyProvider> {
        self.provider
            .as_deref()
            .ok_or(ServerError::AdapterUnavailable)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}
