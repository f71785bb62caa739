//! Yahoo Fantasy Sports adapter.
//!
//! Issues REST calls against the Yahoo Fantasy v2 API and normalizes the
//! nested, loosely typed documents it returns into the flat types in
//! [`models`]. The HTTP facade only sees the [`FantasyProvider`] trait.

pub mod client;
pub mod error;
pub mod favorites;
pub mod json_path;
pub mod models;
pub mod parse;
pub mod provider;
pub mod transactions;

pub use client::{YAHOO_API_BASE, YahooClient};
pub use error::{Result, YahooError};
pub use favorites::enrich_favorites;
pub use models::{
    AvailablePlayer, FreeAgents, LeagueSummary, Player, Roster, RosterAnalysis, Team,
    WaiverClaim, WaiverPriorityItem, WaiverSettings, Waivers,
};
pub use provider::{
    DEFAULT_FREE_AGENT_LIMIT, DEFAULT_POSITIONS, DEFAULT_RECOMMENDATIONS, FantasyProvider,
    MAX_FREE_AGENT_LIMIT, SharedProvider, normalize_positions,
};
pub use transactions::parse_waiver_transactions;
