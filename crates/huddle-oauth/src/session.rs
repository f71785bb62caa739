//! OAuth session management.
//!
//! A [`SessionManager`] owns the credential file and knows how to move it
//! from "no usable access token" to "valid bearer token": either by
//! exchanging a user-supplied authorization code or, on demand before any
//! upstream call, by refreshing with the stored refresh token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{OAuthError, Result};
use crate::oauth::{
    AuthorizationUrl, DEFAULT_TIMEOUT, OAuthConfig, OOB_REDIRECT_URI, TokenGrant,
    basic_auth_header, build_authorization_url, now_epoch_secs, token_is_valid,
};
use crate::store::{CredentialRecord, TokenStore};

/// Longest slice of an upstream error body that ends up in logs.
const LOGGED_BODY_LIMIT: usize = 256;

// ============================================================================
// TokenSource Trait
// ============================================================================

/// Source of bearer tokens for upstream calls.
#[async_trait]
pub trait TokenSource: Send + Sync + std::fmt::Debug {
    /// Get a valid access token, refreshing if necessary.
    async fn access_token(&self) -> Result<String>;

    /// HTTP client that sends the current bearer token on every request.
    async fn authorized_client(&self) -> Result<reqwest::Client> {
        let token = self.access_token().await?;
        bearer_client(&token)
    }
}

/// Shared token source for use across async contexts.
pub type SharedTokenSource = Arc<dyn TokenSource>;

fn bearer_client(token: &str) -> Result<reqwest::Client> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
        OAuthError::InvalidResponse("access token is not a valid header value".to_string())
    })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("huddle/", env!("CARGO_PKG_VERSION"))),
    );

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(DEFAULT_TIMEOUT)
        .build()?)
}

// ============================================================================
// StaticTokenSource
// ============================================================================

/// Token source that always hands out the same token. Used for tests and
/// for deployments that inject a short-lived token directly.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

// ============================================================================
// SessionManager
// ============================================================================

/// Result of a successful authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeOutcome {
    pub status: String,
    pub token_type: Option<String>,
    pub guid: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ConsumerCredentials {
    key: String,
    secret: String,
    redirect_uri: String,
}

/// File-backed OAuth session for the upstream platform.
#[derive(Debug)]
pub struct SessionManager {
    store: TokenStore,
    config: OAuthConfig,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    redirect_uri: Option<String>,
    /// Serializes refreshes and exchanges within this process.
    write_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: TokenStore, config: OAuthConfig) -> Self {
        Self {
            store,
            config,
            consumer_key: None,
            consumer_secret: None,
            redirect_uri: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Consumer credentials that take precedence over the credential file.
    pub fn with_consumer(mut self, key: Option<String>, secret: Option<String>) -> Self {
        self.consumer_key = key;
        self.consumer_secret = secret;
        self
    }

    /// Redirect URI used when neither the request nor the file names one.
    pub fn with_redirect_uri(mut self, redirect_uri: Option<String>) -> Self {
        self.redirect_uri = redirect_uri;
        self
    }

    /// The underlying credential store.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    fn resolve_credentials(&self, record: &CredentialRecord) -> Result<ConsumerCredentials> {
        let key = self
            .consumer_key
            .clone()
            .or_else(|| record.consumer_key.clone())
            .filter(|k| !k.is_empty());
        let secret = self
            .consumer_secret
            .clone()
            .or_else(|| record.consumer_secret.clone())
            .filter(|s| !s.is_empty());

        let (Some(key), Some(secret)) = (key, secret) else {
            return Err(OAuthError::Config(
                "Yahoo consumer key/secret not configured".to_string(),
            ));
        };

        let redirect_uri = record
            .redirect_uri
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| self.redirect_uri.clone())
            .unwrap_or_else(|| OOB_REDIRECT_URI.to_string());

        Ok(ConsumerCredentials {
            key,
            secret,
            redirect_uri,
        })
    }

    /// Build the URL a user visits to start the authorization flow.
    pub fn authorization_url(
        &self,
        state: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> Result<AuthorizationUrl> {
        let record = self.store.load()?;
        let creds = self.resolve_credentials(&record)?;
        let redirect = non_empty(redirect_uri).unwrap_or(creds.redirect_uri);
        let state = non_empty(state);

        Ok(AuthorizationUrl {
            authorization_url: build_authorization_url(
                &self.config,
                &creds.key,
                &redirect,
                state.as_deref(),
            ),
            redirect_uri: redirect,
            state,
        })
    }

    /// Exchange a user-provided authorization code for tokens and persist them.
    ///
    /// Nothing is written unless the upstream returns all of `access_token`,
    /// `refresh_token` and `token_type`.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        state: Option<&str>,
    ) -> Result<ExchangeOutcome> {
        if code.trim().is_empty() {
            return Err(OAuthError::InvalidRequest(
                "Authorization code is required".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let record = self.store.load()?;
        let creds = self.resolve_credentials(&record)?;
        let redirect = non_empty(redirect_uri).unwrap_or_else(|| creds.redirect_uri.clone());

        let (status, body) = self
            .post_token(
                &creds,
                &[
                    ("code", code),
                    ("redirect_uri", redirect.as_str()),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await?;

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate(&body),
                "oauth.exchange.failed"
            );
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                message: "Yahoo rejected the authorization code".to_string(),
            });
        }

        let grant = TokenGrant::parse(&body).inspect_err(|_| {
            tracing::error!(body = %truncate(&body), "oauth.exchange.invalid_json");
        })?;

        let (Some(access_token), Some(refresh_token), Some(token_type)) = (
            grant.access_token.clone(),
            grant.refresh_token.clone(),
            grant.token_type.clone(),
        ) else {
            tracing::error!("oauth.exchange.missing_tokens");
            return Err(OAuthError::InvalidResponse(
                "Yahoo did not provide required OAuth tokens".to_string(),
            ));
        };

        let token_time = now_epoch_secs();
        let mut stored = record;
        stored.consumer_key = Some(creds.key);
        stored.consumer_secret = Some(creds.secret);
        stored.redirect_uri = Some(redirect);
        stored.access_token = Some(access_token);
        stored.refresh_token = Some(refresh_token);
        stored.token_type = Some(token_type);
        stored.token_time = Some(token_time);
        if grant.expires_in.is_some() {
            stored.expires_in = grant.expires_in;
        }
        if grant.scope.is_some() {
            stored.scope = grant.scope.clone();
        }
        if grant.guid.is_some() {
            stored.guid = grant.guid.clone();
        }
        if grant.id_token.is_some() {
            stored.id_token = grant.id_token.clone();
        }
        if let Some(state) = non_empty(state) {
            stored.state = Some(state);
        }

        self.store.save(&stored)?;
        tracing::info!(path = %self.store.path().display(), "oauth.exchange.stored");

        let expires_at = grant.expires_in.and_then(|secs| {
            DateTime::from_timestamp_millis(((token_time + secs as f64) * 1000.0) as i64)
        });

        Ok(ExchangeOutcome {
            status: "stored".to_string(),
            token_type: stored.token_type,
            guid: stored.guid,
            scope: stored.scope,
            expires_at,
        })
    }

    fn usable_token(record: &CredentialRecord) -> Option<String> {
        let token = record.access_token.as_ref().filter(|t| !t.is_empty())?;
        token_is_valid(record.token_time, record.expires_in, now_epoch_secs())
            .then(|| token.clone())
    }

    async fn refresh(&self, record: CredentialRecord) -> Result<String> {
        let creds = self.resolve_credentials(&record)?;
        let Some(refresh_token) = record.refresh_token.clone().filter(|t| !t.is_empty()) else {
            return Err(OAuthError::ReauthorizationRequired(
                "no refresh token stored; complete the authorization flow".to_string(),
            ));
        };

        tracing::info!(file = %self.store.path().display(), "oauth.refresh");
        let (status, body) = self
            .post_token(
                &creds,
                &[
                    ("grant_type", "refresh_token"),
                    ("redirect_uri", creds.redirect_uri.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ],
            )
            .await?;

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                status = status.as_u16(),
                body = %truncate(&body),
                "oauth.refresh.rejected"
            );
            return Err(OAuthError::ReauthorizationRequired(format!(
                "refresh token rejected by Yahoo ({})",
                status.as_u16()
            )));
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                message: "Yahoo token refresh failed".to_string(),
            });
        }

        let grant = TokenGrant::parse(&body)?;
        let Some(access_token) = grant.access_token else {
            return Err(OAuthError::ReauthorizationRequired(
                "Yahoo OAuth did not provide an access_token".to_string(),
            ));
        };

        let mut stored = record;
        stored.access_token = Some(access_token.clone());
        stored.refresh_token = grant.refresh_token.or(Some(refresh_token));
        stored.token_type = grant.token_type.or(stored.token_type);
        stored.token_time = Some(now_epoch_secs());
        stored.expires_in = grant.expires_in.or(stored.expires_in);
        if grant.guid.is_some() {
            stored.guid = grant.guid;
        }
        if grant.scope.is_some() {
            stored.scope = grant.scope;
        }

        self.store.save(&stored)?;
        tracing::info!("oauth.refresh.stored");
        Ok(access_token)
    }

    async fn post_token(
        &self,
        creds: &ConsumerCredentials,
        form: &[(&str, &str)],
    ) -> Result<(StatusCode, String)> {
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .build()?;

        let response = client
            .post(&self.config.token_url)
            .header(AUTHORIZATION, basic_auth_header(&creds.key, &creds.secret))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "oauth.token.network_error");
                OAuthError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::Network(format!("Failed to read token response: {}", e)))?;
        Ok((status, body))
    }
}

#[async_trait]
impl TokenSource for SessionManager {
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = Self::usable_token(&self.store.load()?) {
            return Ok(token);
        }

        let _guard = self.write_lock.lock().await;
        // Another request may have refreshed while we waited.
        let record = self.store.load()?;
        if let Some(token) = Self::usable_token(&record) {
            return Ok(token);
        }
        self.refresh(record).await
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BASIC: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

    fn token_payload() -> serde_json::Value {
        json!({
            "access_token": "new-access",
            "refresh_token": "new-refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "xoauth_yahoo_guid": "GUID123",
        })
    }

    fn manager(temp: &TempDir, token_url: &str) -> SessionManager {
        SessionManager::new(
            TokenStore::new(temp.path().join("oauth2.json")),
            OAuthConfig::yahoo().with_token_url(token_url),
        )
        .with_consumer(Some("client-id".into()), Some("client-secret".into()))
    }

    async fn token_server() -> (MockServer, String) {
        let server = MockServer::start().await;
        let url = format!("{}/oauth2/get_token", server.uri());
        (server, url)
    }

    #[test]
    fn test_authorization_url_uses_defaults() {
        let temp = tempdir().unwrap();
        let manager = manager(&temp, "http://unused")
            .with_redirect_uri(Some("https://example.com/callback".into()));

        let result = manager.authorization_url(None, None).unwrap();
        assert!(
            result
                .authorization_url
                .starts_with("https://api.login.yahoo.com/oauth2/request_auth?")
        );
        assert!(result.authorization_url.contains("client-id"));
        assert_eq!(result.redirect_uri, "https://example.com/callback");
        assert!(result.state.is_none());
    }

    #[test]
    fn test_authorization_url_prefers_explicit_redirect_and_file_credentials() {
        let temp = tempdir().unwrap();
        let store = TokenStore::new(temp.path().join("oauth2.json"));
        store
            .save(&CredentialRecord::with_consumer("file-id", "file-secret"))
            .unwrap();
        let manager = SessionManager::new(store, OAuthConfig::yahoo());

        let result = manager
            .authorization_url(Some("s1"), Some("https://app/cb"))
            .unwrap();
        assert!(result.authorization_url.contains("client_id=file-id"));
        assert_eq!(result.redirect_uri, "https://app/cb");
        assert_eq!(result.state.as_deref(), Some("s1"));
    }

    #[test]
    fn test_missing_consumer_credentials() {
        let temp = tempdir().unwrap();
        let manager = SessionManager::new(
            TokenStore::new(temp.path().join("oauth2.json")),
            OAuthConfig::yahoo(),
        );
        let err = manager.authorization_url(None, None).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_exchange_persists_tokens() {
        let temp = tempdir().unwrap();
        let (server, url) = token_server().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .and(header("authorization", BASIC))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&temp, &url);
        let outcome = manager
            .exchange_code("abc123", None, Some("client-state"))
            .await
            .unwrap();

        assert_eq!(outcome.status, "stored");
        assert_eq!(outcome.guid.as_deref(), Some("GUID123"));
        assert_eq!(outcome.token_type.as_deref(), Some("bearer"));
        assert!(outcome.expires_at.is_some());

        let stored = manager.store().load().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("new-access"));
        assert_eq!(stored.refresh_token.as_deref(), Some("new-refresh"));
        assert_eq!(stored.redirect_uri.as_deref(), Some("oob"));
        assert_eq!(stored.state.as_deref(), Some("client-state"));
        assert_eq!(stored.expires_in, Some(3600));
        assert!(stored.token_time.is_some());
    }

    #[tokio::test]
    async fn test_exchange_missing_refresh_token_writes_nothing() {
        let temp = tempdir().unwrap();
        let (server, url) = token_server().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "only"})),
            )
            .mount(&server)
            .await;

        let manager = manager(&temp, &url);
        let err = manager.exchange_code("abc123", None, None).await.unwrap_err();

        assert!(matches!(err, OAuthError::InvalidResponse(_)));
        assert_eq!(err.status_code(), 502);
        assert!(!manager.store().exists());
    }

    #[tokio::test]
    async fn test_exchange_upstream_rejection_mirrors_status() {
        let temp = tempdir().unwrap();
        let (server, url) = token_server().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let manager = manager(&temp, &url);
        let err = manager.exchange_code("bad", None, None).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(!manager.store().exists());
    }

    #[tokio::test]
    async fn test_exchange_non_json_body() {
        let temp = tempdir().unwrap();
        let (server, url) = token_server().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = manager(&temp, &url)
            .exchange_code("abc", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_exchange_unreachable_upstream() {
        let temp = tempdir().unwrap();
        let err = manager(&temp, "http://127.0.0.1:1/oauth2/get_token")
            .exchange_code("abc", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::Network(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_exchange_blank_code() {
        let temp = tempdir().unwrap();
        let err = manager(&temp, "http://unused")
            .exchange_code("   ", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_valid_token_served_without_refresh() {
        let temp = tempdir().unwrap();
        let manager = manager(&temp, "http://127.0.0.1:1/unreachable");
        let mut record = CredentialRecord::with_consumer("client-id", "client-secret");
        record.access_token = Some("still-good".into());
        record.refresh_token = Some("r".into());
        record.token_time = Some(now_epoch_secs());
        record.expires_in = Some(3600);
        manager.store().save(&record).unwrap();

        assert_eq!(manager.access_token().await.unwrap(), "still-good");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_persisted() {
        let temp = tempdir().unwrap();
        let (server, url) = token_server().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "token_type": "bearer",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&temp, &url);
        let mut record = CredentialRecord::with_consumer("client-id", "client-secret");
        record.access_token = Some("stale".into());
        record.refresh_token = Some("old-refresh".into());
        record.token_time = Some(now_epoch_secs() - 7200.0);
        record.expires_in = Some(3600);
        manager.store().save(&record).unwrap();

        let (a, b) = tokio::join!(manager.access_token(), manager.access_token());
        assert_eq!(a.unwrap(), "fresh");
        assert_eq!(b.unwrap(), "fresh");

        let stored = manager.store().load().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("fresh"));
        // Upstream omitted a new refresh token; the old one is kept.
        assert_eq!(stored.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_requires_reauthorization() {
        let temp = tempdir().unwrap();
        let manager = manager(&temp, "http://127.0.0.1:1/unreachable");
        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, OAuthError::ReauthorizationRequired(_)));
    }

    #[tokio::test]
    async fn test_rejected_refresh_requires_reauthorization() {
        let temp = tempdir().unwrap();
        let (server, url) = token_server().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let manager = manager(&temp, &url);
        let mut record = CredentialRecord::with_consumer("client-id", "client-secret");
        record.refresh_token = Some("revoked".into());
        manager.store().save(&record).unwrap();

        let err = manager.access_token().await.unwrap_err();
        assert!(matches!(err, OAuthError::ReauthorizationRequired(_)));
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_static_token_source_builds_client() {
        let source = StaticTokenSource::new("tok");
        assert_eq!(source.access_token().await.unwrap(), "tok");
        assert!(source.authorized_client().await.is_ok());
    }
}
