//! The seam between the HTTP facade and the upstream platform.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FreeAgents, LeagueSummary, Roster, RosterAnalysis, Waivers};

/// Positions queried when the caller does not name any.
pub const DEFAULT_POSITIONS: &[&str] = &["QB", "RB", "WR", "TE"];

/// Default per-position cap for free-agent listings.
pub const DEFAULT_FREE_AGENT_LIMIT: u32 = 25;

/// Largest per-position cap a caller may request.
pub const MAX_FREE_AGENT_LIMIT: u32 = 50;

/// Default per-position cap for roster-analysis recommendations.
pub const DEFAULT_RECOMMENDATIONS: u32 = 5;

/// Fantasy data source.
#[async_trait]
pub trait FantasyProvider: Send + Sync {
    /// Leagues (with their teams) for the authenticated user, optionally
    /// restricted to one season.
    async fn list_teams(&self, season: Option<i32>) -> Result<Vec<LeagueSummary>>;

    async fn get_roster(&self, team_key: &str, week: Option<u32>) -> Result<Roster>;

    /// Available players per position in the team's league, at most `limit`
    /// per position.
    async fn get_free_agents(
        &self,
        team_key: &str,
        positions: &[String],
        limit: u32,
    ) -> Result<FreeAgents>;

    /// Waiver settings, priority order, and the team's pending claims.
    async fn get_waivers(&self, league_key: &str, team_key: &str) -> Result<Waivers>;

    /// The team's roster plus the top `per_position` free agents per position.
    async fn get_roster_analysis(
        &self,
        team_key: &str,
        positions: &[String],
        per_position: u32,
    ) -> Result<RosterAnalysis> {
        let roster = self.get_roster(team_key, None).await?;
        let free_agents = self
            .get_free_agents(team_key, positions, per_position)
            .await?;

        let per_position = per_position as usize;
        let waiver_recommendations: BTreeMap<_, _> = free_agents
            .free_agents
            .into_iter()
            .map(|(position, mut players)| {
                players.truncate(per_position);
                (position, players)
            })
            .collect();

        Ok(RosterAnalysis {
            team_key: team_key.to_string(),
            roster,
            waiver_recommendations,
        })
    }
}

/// Shared provider handle.
pub type SharedProvider = Arc<dyn FantasyProvider>;

/// Upper-case, drop blanks, split comma lists, and de-duplicate while keeping
/// first-seen order. Falls back to [`DEFAULT_POSITIONS`] when nothing is left.
pub fn normalize_positions<S: AsRef<str>>(positions: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for raw in positions {
        for part in raw.as_ref().split(',') {
            let position = part.trim().to_uppercase();
            if !position.is_empty() && !normalized.contains(&position) {
                normalized.push(position);
            }
        }
    }
    if normalized.is_empty() {
        normalized = DEFAULT_POSITIONS.iter().map(|p| p.to_string()).collect();
    }
    normalized
}
