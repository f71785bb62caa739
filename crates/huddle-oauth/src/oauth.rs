//! Yahoo OAuth 2.0 endpoints and request/response shapes.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OAuthError, Result};

/// Yahoo authorization endpoint.
pub const YAHOO_AUTHORIZE_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";

/// Yahoo token endpoint.
pub const YAHOO_TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";

/// Redirect URI used when nothing else is configured (out-of-band copy/paste).
pub const OOB_REDIRECT_URI: &str = "oob";

/// Per-call timeout for token endpoint requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback access-token lifetime when the upstream does not report one.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Treat tokens as expired this long before they actually are.
pub const EXPIRY_BUFFER_SECS: u64 = 60;

/// OAuth endpoint configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub authorize_url: String,
    pub token_url: String,
    pub timeout: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::yahoo()
    }
}

impl OAuthConfig {
    /// Production Yahoo endpoints.
    pub fn yahoo() -> Self {
        Self {
            authorize_url: YAHOO_AUTHORIZE_URL.to_string(),
            token_url: YAHOO_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the token endpoint somewhere else (mock servers in tests).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Point the authorization endpoint somewhere else.
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }
}

/// Authorization URL handed back to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationUrl {
    pub authorization_url: String,
    pub redirect_uri: String,
    pub state: Option<String>,
}

/// Build the URL a user visits to grant access.
pub fn build_authorization_url(
    config: &OAuthConfig,
    client_id: &str,
    redirect_uri: &str,
    state: Option<&str>,
) -> String {
    let mut params = vec![
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
    ];
    if let Some(state) = state.filter(|s| !s.is_empty()) {
        params.push(("state", state));
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_url, query)
}

/// `Authorization` header value for HTTP Basic auth with consumer credentials.
pub fn basic_auth_header(consumer_key: &str, consumer_secret: &str) -> String {
    let raw = format!("{}:{}", consumer_key, consumer_secret);
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}

/// Fields extracted from a token endpoint response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
    pub guid: Option<String>,
    pub id_token: Option<String>,
}

impl TokenGrant {
    /// Parse a token endpoint body. Non-JSON bodies are an
    /// [`OAuthError::InvalidResponse`]; missing fields are left `None`.
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| OAuthError::InvalidResponse(format!("body is not JSON: {}", e)))?;
        let Value::Object(map) = value else {
            return Err(OAuthError::InvalidResponse(
                "body is not a JSON object".to_string(),
            ));
        };

        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let expires_in = map.get("expires_in").and_then(|v| match v {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });

        Ok(Self {
            access_token: text("access_token"),
            refresh_token: text("refresh_token"),
            token_type: text("token_type"),
            expires_in,
            scope: text("scope"),
            guid: text("xoauth_yahoo_guid"),
            id_token: text("id_token"),
        })
    }
}

/// Whether a token issued at `token_time` with lifetime `expires_in` is still
/// usable at `now` (all in epoch seconds).
pub fn token_is_valid(token_time: Option<f64>, expires_in: Option<u64>, now: f64) -> bool {
    let Some(issued) = token_time else {
        return false;
    };
    let lifetime = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    let usable = lifetime.saturating_sub(EXPIRY_BUFFER_SECS) as f64;
    now - issued < usable
}

/// Current time in epoch seconds.
pub fn now_epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
