//! Environment-sourced settings.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::favorites::{Favorite, parse_favorites};

/// Default location of the OAuth credential file.
pub const DEFAULT_OAUTH_FILE: &str = "/data/oauth2.json";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default steady-state requests per minute per client IP.
pub const DEFAULT_RATE_LIMIT_PER_MIN: u32 = 60;

/// Default burst allowance above the steady rate.
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Process settings, constructed once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the JSON credential file (`YAHOO_OAUTH_FILE`).
    pub oauth_file: PathBuf,
    /// Consumer key override (`YAHOO_CONSUMER_KEY`); falls back to the file.
    pub consumer_key: Option<String>,
    /// Consumer secret override (`YAHOO_CONSUMER_SECRET`); falls back to the file.
    pub consumer_secret: Option<String>,
    /// Default OAuth redirect URI (`YAHOO_REDIRECT_URI`).
    pub redirect_uri: Option<String>,
    /// API key required on `/v1/*` and `/metrics` (`API_KEY`). `None` disables auth.
    pub api_key: Option<String>,
    /// Raw CORS origin list (`CORS_ALLOW_ORIGINS`).
    pub cors_allow_origins: String,
    /// Log filter directive (`LOG_LEVEL`).
    pub log_level: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Steady requests per minute per IP (`RATE_LIMIT_PER_MIN`).
    pub rate_limit_per_min: u32,
    /// Burst above the steady rate (`RATE_LIMIT_BURST`).
    pub rate_limit_burst: u32,
    /// Raw favorites list (`FAVORITE_TEAMS`).
    pub favorite_teams: String,
    /// Whether the upstream adapter is enabled (`UPSTREAM_ENABLED`).
    pub upstream_enabled: bool,
    /// Build commit (`GIT_SHA`).
    pub git_sha: String,
    /// Build timestamp (`BUILD_TIME`).
    pub build_time: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            oauth_file: PathBuf::from(DEFAULT_OAUTH_FILE),
            consumer_key: None,
            consumer_secret: None,
            redirect_uri: None,
            api_key: None,
            cors_allow_origins: "*".to_string(),
            log_level: "info".to_string(),
            port: DEFAULT_PORT,
            rate_limit_per_min: DEFAULT_RATE_LIMIT_PER_MIN,
            rate_limit_burst: DEFAULT_RATE_LIMIT_BURST,
            favorite_teams: String::new(),
            upstream_enabled: true,
            git_sha: "dev".to_string(),
            build_time: "dev".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::DotEnv(e.to_string())),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup. Names are matched
    /// exactly; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            oauth_file: get("YAHOO_OAUTH_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.oauth_file),
            consumer_key: get("YAHOO_CONSUMER_KEY"),
            consumer_secret: get("YAHOO_CONSUMER_SECRET"),
            redirect_uri: get("YAHOO_REDIRECT_URI"),
            api_key: get("API_KEY"),
            cors_allow_origins: get("CORS_ALLOW_ORIGINS").unwrap_or(defaults.cors_allow_origins),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            port: parse_var("PORT", get("PORT"), defaults.port)?,
            rate_limit_per_min: parse_var(
                "RATE_LIMIT_PER_MIN",
                get("RATE_LIMIT_PER_MIN"),
                defaults.rate_limit_per_min,
            )?,
            rate_limit_burst: parse_var(
                "RATE_LIMIT_BURST",
                get("RATE_LIMIT_BURST"),
                defaults.rate_limit_burst,
            )?,
            favorite_teams: get("FAVORITE_TEAMS").unwrap_or_default(),
            upstream_enabled: parse_bool("UPSTREAM_ENABLED", get("UPSTREAM_ENABLED"), true)?,
            git_sha: get("GIT_SHA").unwrap_or(defaults.git_sha),
            build_time: get("BUILD_TIME").unwrap_or(defaults.build_time),
        })
    }

    /// CORS origins; `*` or an empty value means any origin.
    pub fn cors_origins(&self) -> Vec<String> {
        let raw = self.cors_allow_origins.trim();
        if raw.is_empty() || raw == "*" {
            return vec!["*".to_string()];
        }
        raw.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }

    /// Parsed favorite teams.
    pub fn favorite_teams(&self) -> Vec<Favorite> {
        parse_favorites(&self.favorite_teams)
    }
}

fn parse_var<T>(var: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(var: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            var: var.to_string(),
            value: other.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
