//! Normalized response shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─────────────────────────────────────────────────────────────────────────────
// Leagues
// ─────────────────────────────────────────────────────────────────────────────

/// A team within a league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub team_key: String,
    /// Display name, empty when Yahoo omits it.
    pub team_name: String,
    pub waiver_priority: Option<i64>,
}

/// A league the authenticated user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeagueSummary {
    pub league_id: String,
    pub league_key: String,
    pub league_name: Option<String>,
    pub teams: Vec<Team>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rosters and players
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Player {
    pub name: String,
    pub position: Option<String>,
    /// Roster slot such as QB, WR, BN.
    pub slot: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub eligible_positions: Vec<String>,
    pub player_id: Option<i64>,
    pub position_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Roster {
    pub team_key: String,
    pub week: Option<u32>,
    pub players: Vec<Player>,
}

/// A player on the waiver wire or in free agency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AvailablePlayer {
    pub player_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub eligible_positions: Vec<String>,
    pub percent_owned: Option<f64>,
    pub status: Option<String>,
    pub position_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FreeAgents {
    pub team_key: String,
    pub positions: Vec<String>,
    /// Available players keyed by position code.
    pub free_agents: BTreeMap<String, Vec<AvailablePlayer>>,
}

/// A roster alongside the best available pickups per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RosterAnalysis {
    pub team_key: String,
    pub roster: Roster,
    pub waiver_recommendations: BTreeMap<String, Vec<AvailablePlayer>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Waivers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WaiverSettings {
    pub waiver_type: Option<String>,
    pub waiver_rule: Option<String>,
    pub uses_faab: Option<bool>,
    /// Time in seconds players remain on waivers.
    pub waiver_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WaiverPriorityItem {
    pub team_name: String,
    pub team_key: String,
    pub priority: Option<i64>,
}

/// One player movement inside a pending waiver transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WaiverClaim {
    pub player: String,
    pub action_type: String,
    pub source_team_key: Option<String>,
    pub destination_team_key: Option<String>,
    pub faab_bid: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Waivers {
    pub settings: WaiverSettings,
    pub priority: Vec<WaiverPriorityItem>,
    pub pending: Vec<WaiverClaim>,
}

impl From<&Team> for WaiverPriorityItem {
    fn from(team: &Team) -> Self {
        Self {
            team_name: team.team_name.clone(),
            team_key: team.team_key.clone(),
            priority: team.waiver_priority,
        }
    }
}
