//! Serve command - runs the HTTP API.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use huddle_config::Settings;
use huddle_oauth::{OAuthConfig, SessionManager, TokenStore};
use huddle_server::{AppState, Server, ServerConfig};
use huddle_yahoo::YahooClient;
use tracing::info;

use crate::{LogFormat, init_tracing};

/// Arguments for the serve command.
///
/// Flags override the environment.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log filter (overrides LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Apply command-line overrides to environment settings.
fn apply_overrides(mut settings: Settings, args: &ServeArgs) -> Settings {
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }
    settings
}

/// Build the application state the server runs with.
pub fn build_state(settings: &Settings) -> AppState {
    let session = SessionManager::new(TokenStore::new(settings.oauth_file.clone()), OAuthConfig::yahoo())
        .with_consumer(
            settings.consumer_key.clone(),
            settings.consumer_secret.clone(),
        )
        .with_redirect_uri(settings.redirect_uri.clone());

    let state = AppState::new(ServerConfig::from_settings(settings), session);
    if settings.upstream_enabled {
        let client = YahooClient::new(state.oauth.clone());
        state.with_provider(Arc::new(client))
    } else {
        state
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs) -> Result<()> {
    let settings = Settings::from_env().context("Failed to load settings")?;
    let settings = apply_overrides(settings, &args);
    init_tracing(&settings.log_level, LogFormat::Json);

    info!(
        port = settings.port,
        oauth_file = %settings.oauth_file.display(),
        auth_enabled = settings.api_key.is_some(),
        upstream_enabled = settings.upstream_enabled,
        git_sha = %settings.git_sha,
        "Starting huddle"
    );
    if settings.api_key.is_none() {
        tracing::warn!("API_KEY is not set; /v1 endpoints are unauthenticated");
    }

    let server = Server::new(build_state(&settings));
    server.run().await?;
    Ok(())
}
