//! Normalization of Yahoo resource documents into [`crate::models`] types.
//!
//! Every function here is total: a document that does not have the expected
//! shape produces empty or `None` fields rather than an error.

use serde_json::Value;

use crate::json_path::{as_bool, collection, first, first_f64, first_i64, first_str, flatten, lookup};
use crate::models::{AvailablePlayer, Player, Roster, Team, WaiverSettings};

/// Player name aliases, most specific first.
const NAME_PATHS: &[&str] = &["name.full", "name", "full", "full_name", "display_position"];

/// League metadata and waiver settings from `/league/{key}/settings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueSettings {
    pub league_key: Option<String>,
    pub league_id: Option<String>,
    pub name: Option<String>,
    pub waiver: WaiverSettings,
}

/// League keys from a `users;use_login=1/games/leagues` document.
pub fn parse_league_keys(doc: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    let Some(users) = lookup(doc, "fantasy_content.users") else {
        return keys;
    };
    for user in collection(users) {
        let Some(games) = lookup(user, "user.1.games") else {
            continue;
        };
        for game in collection(games) {
            let Some(leagues) = lookup(game, "game.1.leagues") else {
                continue;
            };
            for league in collection(leagues) {
                let meta = flatten(lookup(league, "league.0").unwrap_or(&Value::Null));
                if let Some(key) = first_str(&meta, &["league_key"]) {
                    keys.push(key);
                }
            }
        }
    }
    keys
}

pub fn parse_league_settings(doc: &Value) -> LeagueSettings {
    let meta = flatten(lookup(doc, "fantasy_content.league.0").unwrap_or(&Value::Null));
    let settings = flatten(lookup(doc, "fantasy_content.league.1.settings.0").unwrap_or(&Value::Null));

    LeagueSettings {
        league_key: first_str(&meta, &["league_key"]),
        league_id: first_str(&meta, &["league_id"]),
        name: league_name(&meta),
        waiver: WaiverSettings {
            waiver_type: first_str(&settings, &["waiver_type"]),
            waiver_rule: first_str(&settings, &["waiver_rule"]),
            uses_faab: first(&settings, &["uses_faab"]).and_then(as_bool),
            waiver_time: first_i64(&settings, &["waiver_time"]),
        },
    }
}

/// League display name from a `/league/{key}/metadata` document.
pub fn parse_league_metadata_name(doc: &Value) -> Option<String> {
    league_name(&flatten(lookup(doc, "fantasy_content.league.0")?))
}

fn league_name(meta: &Value) -> Option<String> {
    first_str(meta, &["name", "league_name"])
}

/// Teams from a `/league/{key}/teams` document, in Yahoo's order.
pub fn parse_teams(doc: &Value) -> Vec<Team> {
    let Some(teams) = lookup(doc, "fantasy_content.league.1.teams") else {
        return Vec::new();
    };
    collection(teams)
        .into_iter()
        .filter_map(|entry| {
            let attrs = flatten(lookup(entry, "team.0")?);
            let team_key = first_str(&attrs, &["team_key"])?;
            Some(Team {
                team_key,
                team_name: first_str(&attrs, &["name", "team_name"]).unwrap_or_default(),
                waiver_priority: first_i64(&attrs, &["waiver_priority"]),
            })
        })
        .collect()
}

/// Roster from a `/team/{key}/roster` document.
pub fn parse_roster(doc: &Value, team_key: &str, week: Option<u32>) -> Roster {
    let players = lookup(doc, "fantasy_content.team.1.roster.0.players")
        .map(|players| {
            collection(players)
                .into_iter()
                .filter_map(|entry| entry.get("player"))
                .map(|raw| roster_player(&flatten(raw)))
                .collect()
        })
        .unwrap_or_default();

    Roster {
        team_key: team_key.to_string(),
        week,
        players,
    }
}

fn roster_player(attrs: &Value) -> Player {
    let slot = attrs
        .get("selected_position")
        .map(flatten)
        .and_then(|sp| first_str(&sp, &["position"]));

    Player {
        name: player_name(attrs),
        position: first_str(attrs, &["primary_position", "display_position", "position"]),
        slot,
        status: first_str(attrs, &["status"]),
        eligible_positions: eligible_positions(attrs),
        player_id: first_i64(attrs, &["player_id"]),
        position_type: first_str(attrs, &["position_type"]),
    }
}

/// Players from a `/league/{key}/players;...` document, capped at `limit`.
pub fn parse_available_players(doc: &Value, limit: usize) -> Vec<AvailablePlayer> {
    let Some(players) = lookup(doc, "fantasy_content.league.1.players") else {
        return Vec::new();
    };
    collection(players)
        .into_iter()
        .filter_map(|entry| entry.get("player"))
        .take(limit)
        .map(|raw| {
            let attrs = flatten(raw);
            let percent_owned = attrs
                .get("percent_owned")
                .map(flatten)
                .and_then(|po| first_f64(&po, &["value"]));
            AvailablePlayer {
                player_id: first_i64(&attrs, &["player_id"]),
                name: player_name(&attrs),
                eligible_positions: eligible_positions(&attrs),
                percent_owned,
                status: first_str(&attrs, &["status"]),
                position_type: first_str(&attrs, &["position_type"]),
            }
        })
        .collect()
}

pub(crate) fn player_name(attrs: &Value) -> String {
    first_str(attrs, NAME_PATHS).unwrap_or_default()
}

fn eligible_positions(attrs: &Value) -> Vec<String> {
    let Some(positions) = attrs.get("eligible_positions") else {
        return Vec::new();
    };
    collection(positions)
        .into_iter()
        .filter_map(|p| match p {
            Value::String(s) => Some(s.clone()),
            other => first_str(other, &["position"]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn teams_doc() -> Value {
        json!({"fantasy_content": {"league": [
            {"league_key": "423.l.12345", "name": "League 12345"},
            {"teams": {
                "0": {"team": [[
                    {"team_key": "423.l.12345.t.1"},
                    {"team_id": "1"},
                    {"name": "Team One"},
                    [],
                    {"waiver_priority": 2}
                ]]},
                "1": {"team": [[
                    {"team_key": "423.l.12345.t.7"},
                    {"name": "Team Seven"},
                    {"waiver_priority": "1"}
                ]]},
                "2": {"team": [[{"name": "No key"}]]},
                "count": 3
            }}
        ]}})
    }

    #[test]
    fn test_parse_league_keys() {
        let doc = json!({"fantasy_content": {"users": {"0": {"user": [
            {"guid": "G"},
            {"games": {
                "0": {"game": [
                    {"game_key": "423", "code": "nfl"},
                    {"leagues": {
                        "0": {"league": [{"league_key": "423.l.1", "name": "A"}]},
                        "1": {"league": [{"league_key": "423.l.2", "name": "B"}]},
                        "count": 2
                    }}
                ]},
                "1": {"game": [{"game_key": "414"}]},
                "count": 2
            }}
        ]}, "count": 1}}});

        assert_eq!(parse_league_keys(&doc), vec!["423.l.1", "423.l.2"]);
        assert!(parse_league_keys(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_league_settings() {
        let doc = json!({"fantasy_content": {"league": [
            {"league_key": "423.l.12345", "league_id": "12345", "name": "League 12345"},
            {"settings": [{
                "waiver_type": "FR",
                "waiver_rule": "gametime",
                "uses_faab": "1",
                "waiver_time": "2"
            }]}
        ]}});

        let settings = parse_league_settings(&doc);
        assert_eq!(settings.league_key.as_deref(), Some("423.l.12345"));
        assert_eq!(settings.league_id.as_deref(), Some("12345"));
        assert_eq!(settings.name.as_deref(), Some("League 12345"));
        assert_eq!(settings.waiver.waiver_type.as_deref(), Some("FR"));
        assert_eq!(settings.waiver.uses_faab, Some(true));
        assert_eq!(settings.waiver.waiver_time, Some(2));
    }

    #[test]
    fn test_parse_league_settings_tolerates_missing_sections() {
        let settings = parse_league_settings(&json!({"fantasy_content": {}}));
        assert_eq!(settings, LeagueSettings::default());
    }

    #[test]
    fn test_parse_teams() {
        let teams = parse_teams(&teams_doc());
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_key, "423.l.12345.t.1");
        assert_eq!(teams[0].team_name, "Team One");
        assert_eq!(teams[0].waiver_priority, Some(2));
        assert_eq!(teams[1].team_name, "Team Seven");
        assert_eq!(teams[1].waiver_priority, Some(1));
    }

    #[test]
    fn test_parse_roster_name_fallbacks() {
        let doc = json!({"fantasy_content": {"team": [
            [{"team_key": "423.l.1.t.1"}],
            {"roster": {"0": {"players": {
                "0": {"player": [
                    [
                        {"player_id": "30123"},
                        {"name": {"full": "Josh Allen", "first": "Josh"}},
                        {"display_position": "QB"},
                        {"primary_position": "QB"},
                        {"position_type": "O"},
                        {"eligible_positions": [{"position": "QB"}]}
                    ],
                    {"selected_position": [{"coverage_type": "week"}, {"position": "QB"}]}
                ]},
                "1": {"player": [
                    [{"full_name": "Fallback Name"}, {"status": "Q"}],
                    {"selected_position": [{"position": "BN"}]}
                ]},
                "2": {"player": [[{"display_position": "DEF"}]]},
                "3": {"player": [[{"player_id": "9"}]]},
                "count": 4
            }}}}
        ]}});

        let roster = parse_roster(&doc, "423.l.1.t.1", Some(3));
        assert_eq!(roster.week, Some(3));
        assert_eq!(roster.players.len(), 4);

        let allen = &roster.players[0];
        assert_eq!(allen.name, "Josh Allen");
        assert_eq!(allen.position.as_deref(), Some("QB"));
        assert_eq!(allen.slot.as_deref(), Some("QB"));
        assert_eq!(allen.player_id, Some(30123));
        assert_eq!(allen.eligible_positions, vec!["QB"]);
        assert_eq!(allen.position_type.as_deref(), Some("O"));

        assert_eq!(roster.players[1].name, "Fallback Name");
        assert_eq!(roster.players[1].slot.as_deref(), Some("BN"));
        assert_eq!(roster.players[1].status.as_deref(), Some("Q"));
        assert_eq!(roster.players[2].name, "DEF");
        assert_eq!(roster.players[3].name, "");
    }

    #[test]
    fn test_parse_roster_empty_document() {
        let roster = parse_roster(&json!({}), "423.l.1.t.1", None);
        assert!(roster.players.is_empty());
        assert_eq!(roster.team_key, "423.l.1.t.1");
    }

    #[test]
    fn test_parse_available_players() {
        let doc = json!({"fantasy_content": {"league": [
            {"league_key": "423.l.1"},
            {"players": {
                "0": {"player": [
                    [{"player_id": "1"}, {"name": {"full": "Alpha"}}, {"status": "O"}],
                    {"percent_owned": [{"coverage_type": "week"}, {"value": "12.5"}]}
                ]},
                "1": {"player": [[{"player_id": "2"}, {"name": {"full": "Beta"}}]]},
                "2": {"player": [[{"player_id": "3"}, {"name": {"full": "Gamma"}}]]},
                "count": 3
            }}
        ]}});

        let players = parse_available_players(&doc, 2);
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name, "Alpha");
        assert_eq!(players[0].percent_owned, Some(12.5));
        assert_eq!(players[0].status.as_deref(), Some("O"));
        assert_eq!(players[1].percent_owned, None);
    }
}
