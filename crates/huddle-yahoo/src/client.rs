//! REST client for the Yahoo Fantasy Sports v2 API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use huddle_config::league_key_from_team_key;
use huddle_oauth::SharedTokenSource;
use serde_json::Value;

use crate::error::{Result, YahooError};
use crate::models::{FreeAgents, LeagueSummary, Roster, Team, WaiverPriorityItem, Waivers};
use crate::parse::{
    LeagueSettings, parse_available_players, parse_league_keys, parse_league_metadata_name,
    parse_league_settings, parse_roster, parse_teams,
};
use crate::provider::{FantasyProvider, MAX_FREE_AGENT_LIMIT, normalize_positions};
use crate::transactions::parse_waiver_transactions;

/// Production API root.
pub const YAHOO_API_BASE: &str = "https://fantasysports.yahooapis.com/fantasy/v2";

/// Longest slice of an error body kept in [`YahooError::Http`].
const ERROR_BODY_LIMIT: usize = 256;

/// Yahoo Fantasy Sports client.
///
/// Each call asks the token source for an authorized HTTP client, so an
/// expired token is refreshed before the request goes out.
#[derive(Clone)]
pub struct YahooClient {
    tokens: SharedTokenSource,
    base_url: String,
}

impl YahooClient {
    pub fn new(tokens: SharedTokenSource) -> Self {
        Self {
            tokens,
            base_url: YAHOO_API_BASE.to_string(),
        }
    }

    /// Use a different API root (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET a resource path (relative to the API root) as JSON.
    async fn get_json(&self, resource: &str) -> Result<Value> {
        let url = format!("{}/{}?format=json", self.base_url, resource);
        let client = self.tokens.authorized_client().await?;

        tracing::debug!(%url, "yahoo.request");
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            tracing::warn!(status = status.as_u16(), resource, body = %message, "yahoo.request.failed");
            return Err(YahooError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| YahooError::Decode(e.to_string()))
    }

    async fn league_keys(&self, season: Option<i32>) -> Result<Vec<String>> {
        let games = match season {
            Some(year) => format!("games;game_codes=nfl;seasons={}", year),
            None => "games;game_codes=nfl".to_string(),
        };
        let doc = self
            .get_json(&format!("users;use_login=1/{}/leagues", games))
            .await?;
        Ok(parse_league_keys(&doc))
    }

    async fn league_settings(&self, league_key: &str) -> Result<LeagueSettings> {
        let doc = self
            .get_json(&format!("league/{}/settings", league_key))
            .await?;
        Ok(parse_league_settings(&doc))
    }

    /// Secondary name lookup. Failures are not fatal to the listing.
    async fn league_metadata_name(&self, league_key: &str) -> Option<String> {
        match self.get_json(&format!("league/{}/metadata", league_key)).await {
            Ok(doc) => parse_league_metadata_name(&doc),
            Err(e) => {
                tracing::debug!(league_key, error = %e, "yahoo.league_metadata.failed");
                None
            }
        }
    }

    async fn league_teams(&self, league_key: &str) -> Result<Vec<Team>> {
        let doc = self.get_json(&format!("league/{}/teams", league_key)).await?;
        Ok(parse_teams(&doc))
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FantasyProvider for YahooClient {
    async fn list_teams(&self, season: Option<i32>) -> Result<Vec<LeagueSummary>> {
        let mut leagues = Vec::new();
        for key in self.league_keys(season).await? {
            let settings = self.league_settings(&key).await?;
            let league_key = settings.league_key.clone().unwrap_or_else(|| key.clone());

            let league_name = match settings.name {
                Some(name) => Some(name),
                None => self.league_metadata_name(&league_key).await,
            };
            let league_id = settings.league_id.unwrap_or_else(|| {
                league_key.rsplit(".l.").next().unwrap_or_default().to_string()
            });

            let teams = self.league_teams(&league_key).await?;
            leagues.push(LeagueSummary {
                league_id,
                league_key,
                league_name,
                teams,
            });
        }
        Ok(leagues)
    }

    async fn get_roster(&self, team_key: &str, week: Option<u32>) -> Result<Roster> {
        let resource = match week {
            Some(w) => format!("team/{}/roster;week={}", team_key, w),
            None => format!("team/{}/roster", team_key),
        };
        let doc = self.get_json(&resource).await?;
        Ok(parse_roster(&doc, team_key, week))
    }

    async fn get_free_agents(
        &self,
        team_key: &str,
        positions: &[String],
        limit: u32,
    ) -> Result<FreeAgents> {
        let positions = normalize_positions(positions);
        let limit = limit.clamp(1, MAX_FREE_AGENT_LIMIT);
        let league_key = league_key_from_team_key(team_key)
            .unwrap_or_else(|| team_key.split(".t.").next().unwrap_or_default().to_string());

        let mut free_agents = BTreeMap::new();
        for position in &positions {
            let doc = self
                .get_json(&format!(
                    "league/{}/players;status=A;position={};sort=AR;count={};out=percent_owned",
                    league_key, position, limit
                ))
                .await?;
            free_agents.insert(
                position.clone(),
                parse_available_players(&doc, limit as usize),
            );
        }

        Ok(FreeAgents {
            team_key: team_key.to_string(),
            positions,
            free_agents,
        })
    }

    async fn get_waivers(&self, league_key: &str, team_key: &str) -> Result<Waivers> {
        let settings = self.league_settings(league_key).await?;
        let priority = self
            .league_teams(league_key)
            .await?
            .iter()
            .map(WaiverPriorityItem::from)
            .collect();

        let doc = self
            .get_json(&format!(
                "league/{}/transactions;types=waiver;team_key={}",
                league_key, team_key
            ))
            .await?;

        Ok(Waivers {
            settings: settings.waiver,
            priority,
            pending: parse_waiver_transactions(&doc),
        })
    }
}
