//! Pending waiver claims from `/league/{key}/transactions;types=waiver`.
//!
//! The transaction document is the least consistent thing Yahoo serves: the
//! transaction collection, each transaction, its player actions, and each
//! action's `transaction_data` may independently arrive as a keyed object or
//! a list. Anything that does not line up is skipped.

use serde_json::Value;

use crate::json_path::{as_f64, collection, first_str, flatten, lookup};
use crate::models::WaiverClaim;
use crate::parse::player_name;

const DEFAULT_ACTION: &str = "waiver";

/// Flatten a transactions document into one claim per player action.
pub fn parse_waiver_transactions(doc: &Value) -> Vec<WaiverClaim> {
    let Some(transactions) = lookup(doc, "fantasy_content.league.1.transactions") else {
        return Vec::new();
    };

    let mut pending = Vec::new();
    for entry in collection(transactions) {
        let Some(raw) = entry.as_object().and_then(|e| e.get("transaction")) else {
            continue;
        };
        let transaction = flatten(raw);
        let transaction_type =
            first_str(&transaction, &["type"]).unwrap_or_else(|| DEFAULT_ACTION.to_string());
        let faab_bid = transaction.get("faab_bid").and_then(as_f64);

        let Some(actions) = transaction.get("players") else {
            continue;
        };
        for action in collection(actions) {
            let Some(player) = action.as_object().and_then(|a| a.get("player")) else {
                continue;
            };
            let player = flatten(player);
            let data = action
                .get("transaction_data")
                .or_else(|| player.get("transaction_data"))
                .map(flatten)
                .unwrap_or_else(|| Value::Object(Default::default()));

            pending.push(WaiverClaim {
                player: first_str(&player, &["name.full"]).unwrap_or_else(|| player_name(&player)),
                action_type: first_str(&data, &["type"]).unwrap_or_else(|| transaction_type.clone()),
                source_team_key: first_str(&data, &["source_team_key"]),
                destination_team_key: first_str(&data, &["destination_team_key"]),
                faab_bid,
            });
        }
    }
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_drop_transaction() -> Value {
        json!({"transaction": [
            {"transaction_key": "423.l.1.w.c.2_1", "type": "add/drop", "faab_bid": "17", "status": "pending"},
            {"players": {
                "0": {"player": [
                    [{"player_key": "423.p.1"}, {"name": {"full": "Waiver Target"}}],
                    {"transaction_data": [{
                        "type": "add",
                        "source_type": "waivers",
                        "destination_type": "team",
                        "destination_team_key": "423.l.1.t.7"
                    }]}
                ]},
                "1": {"player": [
                    [{"player_key": "423.p.2"}, {"name": {"full": "Dropped Guy"}}],
                    {"transaction_data": {
                        "type": "drop",
                        "source_type": "team",
                        "source_team_key": "423.l.1.t.7",
                        "destination_type": "waivers"
                    }}
                ]},
                "count": 2
            }}
        ]})
    }

    fn document(transactions: Option<Value>) -> Value {
        let mut league_body = serde_json::Map::new();
        if let Some(t) = transactions {
            league_body.insert("transactions".to_string(), t);
        }
        json!({"fantasy_content": {"league": [{"league_key": "423.l.1"}, league_body]}})
    }

    #[test]
    fn test_keyed_and_list_collections_parse_identically() {
        let keyed = document(Some(json!({"0": add_drop_transaction(), "count": 1})));
        let listed = document(Some(json!([add_drop_transaction()])));

        let from_keyed = parse_waiver_transactions(&keyed);
        assert_eq!(from_keyed, parse_waiver_transactions(&listed));
        assert_eq!(from_keyed.len(), 2);

        let add = &from_keyed[0];
        assert_eq!(add.player, "Waiver Target");
        assert_eq!(add.action_type, "add");
        assert_eq!(add.destination_team_key.as_deref(), Some("423.l.1.t.7"));
        assert_eq!(add.source_team_key, None);
        assert_eq!(add.faab_bid, Some(17.0));

        let drop = &from_keyed[1];
        assert_eq!(drop.player, "Dropped Guy");
        assert_eq!(drop.action_type, "drop");
        assert_eq!(drop.source_team_key.as_deref(), Some("423.l.1.t.7"));
    }

    #[test]
    fn test_absent_transactions_yield_nothing() {
        assert!(parse_waiver_transactions(&document(None)).is_empty());
        assert!(parse_waiver_transactions(&json!({})).is_empty());
        assert!(parse_waiver_transactions(&json!({"fantasy_content": {"league": []}})).is_empty());
    }

    #[test]
    fn test_action_type_defaults_to_transaction_type() {
        let doc = document(Some(json!([{"transaction": {
            "players": [{"player": [[{"name": {"full": "No Data"}}]]}]
        }}])));

        let claims = parse_waiver_transactions(&doc);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].action_type, "waiver");
        assert_eq!(claims[0].faab_bid, None);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let doc = document(Some(json!([
            "garbage",
            {"not_a_transaction": {}},
            {"transaction": {"type": "add"}},
            {"transaction": {"players": ["junk", {"no_player": true}]}},
            {"transaction": {"faab_bid": "n/a", "players": [{"player": [{"name": "Plain"}]}]}}
        ])));

        let claims = parse_waiver_transactions(&doc);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].player, "Plain");
        assert_eq!(claims[0].faab_bid, None);
    }
}
