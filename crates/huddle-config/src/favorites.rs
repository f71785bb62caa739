//! Favorite teams configured through `FAVORITE_TEAMS`.
//!
//! The value is a single delimited string. Entries are separated by `;` when
//! present, otherwise by `,`. Each entry is `[alias@]league_key|team_key`
//! (`:` is accepted in place of `|`), or a bare team key whose league key is
//! derived from the `{game}.l.{league}.t.{team}` pattern.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

static TEAM_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.l\.\d+)\.t\.\d+$").expect("valid team key regex"));

static LEAGUE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.l\.\d+$").expect("valid league key regex"));

/// A configured favorite team, optionally enriched with display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    /// League key, e.g. `423.l.12345`. Empty when it cannot be derived.
    pub league_key: String,
    /// Team key, e.g. `423.l.12345.t.7`.
    pub team_key: String,
    /// Human alias; `fav{n}` when not configured.
    pub alias: String,
    /// Team display name (filled by enrichment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    /// League display name (filled by enrichment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_name: Option<String>,
}

impl Favorite {
    pub fn new(
        league_key: impl Into<String>,
        team_key: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            league_key: league_key.into(),
            team_key: team_key.into(),
            alias: alias.into(),
            team_name: None,
            league_name: None,
        }
    }

    /// Render this favorite back into the `alias@league|team` config form.
    pub fn to_config_entry(&self) -> String {
        format!("{}@{}|{}", self.alias, self.league_key, self.team_key)
    }
}

/// Render favorites as a `FAVORITE_TEAMS` value.
///
/// Every entry is `;`-terminated so the parser never falls back to `,` as the
/// separator, which keeps aliases containing commas intact.
pub fn render_favorites(favorites: &[Favorite]) -> String {
    favorites
        .iter()
        .map(|fav| format!("{};", fav.to_config_entry()))
        .collect()
}

/// Whether `key` looks like `{game}.l.{league}.t.{team}`.
pub fn is_team_key(key: &str) -> bool {
    TEAM_KEY_RE.is_match(key)
}

/// Whether `key` looks like `{game}.l.{league}`.
pub fn is_league_key(key: &str) -> bool {
    LEAGUE_KEY_RE.is_match(key)
}

/// Derive `{game}.l.{league}` from a team key, if it matches the pattern.
pub fn league_key_from_team_key(team_key: &str) -> Option<String> {
    TEAM_KEY_RE
        .captures(team_key)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a `FAVORITE_TEAMS` value. Never fails; malformed entries without a
/// team key are skipped and an empty string yields an empty list.
pub fn parse_favorites(raw: &str) -> Vec<Favorite> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let entries: Vec<&str> = match [';', ','].into_iter().find(|sep| raw.contains(*sep)) {
        Some(sep) => raw
            .split(sep)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec![raw],
    };

    let mut favorites = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        let (alias, pair) = match entry.split_once('@') {
            Some((alias, pair)) if !alias.trim().is_empty() => {
                (alias.trim().to_string(), pair.trim())
            }
            Some((_, pair)) => (format!("fav{}", idx + 1), pair.trim()),
            None => (format!("fav{}", idx + 1), entry),
        };

        let (mut league_key, team_key) = match pair.split_once('|').or_else(|| pair.split_once(':'))
        {
            Some((league, team)) => (league.trim().to_string(), team.trim().to_string()),
            None => (String::new(), pair.trim().to_string()),
        };

        if team_key.is_empty() {
            tracing::debug!(entry, "skipping favorite entry without a team key");
            continue;
        }
        if league_key.is_empty() {
            league_key = league_key_from_team_key(&team_key).unwrap_or_default();
        }

        favorites.push(Favorite::new(league_key, team_key, alias));
    }
    favorites
}
