//! Best-effort enrichment of configured favorites with upstream names.

use std::collections::HashMap;

use huddle_config::Favorite;

use crate::models::LeagueSummary;
use crate::provider::FantasyProvider;

struct TeamInfo<'a> {
    league_key: &'a str,
    league_name: Option<&'a str>,
    team_name: &'a str,
}

/// Fill in team and league names from one league listing.
///
/// Favorites are matched by team key first and by league key otherwise.
/// If the listing cannot be fetched the input comes back unchanged.
pub async fn enrich_favorites(
    provider: &dyn FantasyProvider,
    favorites: Vec<Favorite>,
) -> Vec<Favorite> {
    if favorites.is_empty() {
        return favorites;
    }

    match provider.list_teams(None).await {
        Ok(leagues) => apply_listing(&leagues, favorites),
        Err(e) => {
            tracing::warn!(error = %e, "favorites.enrichment_failed");
            favorites
        }
    }
}

fn apply_listing(leagues: &[LeagueSummary], favorites: Vec<Favorite>) -> Vec<Favorite> {
    let mut league_names: HashMap<&str, Option<&str>> = HashMap::new();
    let mut teams: HashMap<&str, TeamInfo<'_>> = HashMap::new();
    for league in leagues {
        let league_name = league.league_name.as_deref();
        league_names.insert(&league.league_key, league_name);
        for team in league.teams.iter().filter(|t| !t.team_key.is_empty()) {
            teams.insert(
                &team.team_key,
                TeamInfo {
                    league_key: &league.league_key,
                    league_name,
                    team_name: &team.team_name,
                },
            );
        }
    }

    favorites
        .into_iter()
        .map(|mut favorite| {
            if let Some(info) = teams.get(favorite.team_key.as_str()) {
                if favorite.league_key.is_empty() {
                    favorite.league_key = info.league_key.to_string();
                }
                favorite.team_name = Some(info.team_name.to_string());
                favorite.league_name = info.league_name.map(String::from);
            } else if let Some(name) = league_names.get(favorite.league_key.as_str()) {
                favorite.league_name = name.map(String::from);
            }
            favorite
        })
        .collect()
}
