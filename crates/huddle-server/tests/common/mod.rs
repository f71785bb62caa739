//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use huddle_oauth::{CredentialRecord, OAuthConfig, SessionManager, TokenStore};
use huddle_server::{API_KEY_HEADER, AppState, Server, ServerConfig};
use huddle_yahoo::YahooClient;
use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-key";

/// Credential file contents for a freshly issued token.
pub fn fresh_credentials(access_token: &str) -> CredentialRecord {
    CredentialRecord {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("refresh-1".to_string()),
        token_type: Some("bearer".to_string()),
        token_time: Some(huddle_oauth::oauth::now_epoch_secs()),
        expires_in: Some(3600),
        ..CredentialRecord::with_consumer("client-id", "client-secret")
    }
}

/// Options for [`TestServer::start_with`].
pub struct TestOptions {
    pub config: ServerConfig,
    pub credentials: CredentialRecord,
    pub upstream_enabled: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            config: ServerConfig::new(Some(API_KEY.to_string()))
                .with_rate_limiting(false)
                .with_request_logging(false),
            credentials: fresh_credentials("access-1"),
            upstream_enabled: true,
        }
    }
}

/// A server running in the background against a mock Yahoo API.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    /// Mock Yahoo, serving both the fantasy API and the token endpoint.
    pub upstream: MockServer,
    pub store: TokenStore,
    _handle: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(TestOptions::default()).await
    }

    pub async fn start_with(options: TestOptions) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let upstream = MockServer::start().await;
        let addr = find_available_port().await?;

        let store = TokenStore::new(temp_dir.path().join("oauth2.json"));
        store.save(&options.credentials)?;

        let oauth_config = OAuthConfig::yahoo()
            .with_token_url(format!("{}/oauth2/get_token", upstream.uri()))
            .with_authorize_url(format!("{}/oauth2/request_auth", upstream.uri()));
        let session = SessionManager::new(store.clone(), oauth_config);

        let config = options.config.with_bind_address(addr);
        let mut state = AppState::new(config, session);
        if options.upstream_enabled {
            let client = YahooClient::new(state.oauth.clone()).with_base_url(upstream.uri());
            state = state.with_provider(Arc::new(client));
        }

        let server = Server::new(state);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            upstream,
            store,
            _handle: handle,
            _temp_dir: temp_dir,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET with the API key.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.anonymous_get(path).header(API_KEY_HEADER, API_KEY)
    }

    /// GET without credentials.
    pub fn anonymous_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// POST with the API key.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .header(API_KEY_HEADER, API_KEY)
    }

    /// Serve `body` for GETs whose path matches `route`.
    pub async fn mount_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path_regex(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.upstream)
            .await;
    }

    /// One league, `423.l.12345`, whose only team is team 7.
    pub async fn mount_single_league(&self) {
        self.mount_json(
            r"^/users;use_login=1/games;game_codes=nfl/leagues$",
            json!({"fantasy_content": {"users": {"0": {"user": [
                {"guid": "G"},
                {"games": {"0": {"game": [{"code": "nfl"}, {"leagues": {
                    "0": {"league": [{"league_key": "423.l.12345"}]}, "count": 1
                }}]}, "count": 1}}
            ]}, "count": 1}}}),
        )
        .await;
        self.mount_json(
            r"/league/423\.l\.12345/settings$",
            json!({"fantasy_content": {"league": [
                {"league_key": "423.l.12345", "league_id": "12345", "name": "League 12345"},
                {"settings": [{"waiver_type": "R", "waiver_rule": "gametime", "uses_faab": "1"}]}
            ]}}),
        )
        .await;
        self.mount_json(
            r"/league/423\.l\.12345/teams$",
            json!({"fantasy_content": {"league": [
                {"league_key": "423.l.12345"},
                {"teams": {"0": {"team": [[
                    {"team_key": "423.l.12345.t.7"}, {"name": "Team Seven"}, {"waiver_priority": 2}
                ]]}, "count": 1}}
            ]}}),
        )
        .await;
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
