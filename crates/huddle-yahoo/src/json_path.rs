//! Explicit accessors for Yahoo's loosely structured JSON.
//!
//! Yahoo responses mix three shapes for the same logical data:
//!
//! - keyed collections: `{"0": {...}, "1": {...}, "count": 2}`
//! - plain lists: `[{...}, {...}]`
//! - attribute lists: `[{"team_key": "..."}, {"name": "..."}, [], ...]`
//!
//! Paths are dot separated. A numeric segment indexes a list or looks up the
//! same key in an object, so `fantasy_content.league.1.teams` walks both
//! `{"league": [meta, {"teams": ...}]}` and `{"league": {"1": {...}}}`.

use serde_json::{Map, Value};

/// Resolve a dotted path. The empty path resolves to `value` itself.
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// First path that resolves to a non-null value.
pub fn first<'v>(value: &'v Value, paths: &[&str]) -> Option<&'v Value> {
    paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .find(|v| !v.is_null())
}

/// First path that resolves to a non-empty string. Numbers are rendered as
/// strings since Yahoo is inconsistent about quoting ids.
pub fn first_str(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match lookup(value, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First path that resolves to an integer, accepting numeric strings.
pub fn first_i64(value: &Value, paths: &[&str]) -> Option<i64> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(as_i64))
}

/// First path that resolves to a float, accepting numeric strings.
pub fn first_f64(value: &Value, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .find_map(|path| lookup(value, path).and_then(as_f64))
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Yahoo's boolean flags arrive as `"1"`/`"0"`, numbers, or real booleans.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim() {
            "1" | "true" | "True" => Some(true),
            "0" | "false" | "False" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Merge an attribute list into one object.
///
/// Objects are returned as-is. Lists have every object element merged in
/// order, with nested lists flattened recursively; later keys win. Anything
/// else flattens to an empty object.
pub fn flatten(value: &Value) -> Value {
    let mut merged = Map::new();
    merge_into(&mut merged, value);
    Value::Object(merged)
}

fn merge_into(target: &mut Map<String, Value>, value: &Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                target.insert(k.clone(), v.clone());
            }
        }
        Value::Array(items) => {
            for item in items {
                merge_into(target, item);
            }
        }
        _ => {}
    }
}

/// Members of a collection in order.
///
/// Lists yield their elements. Objects yield numerically keyed members in
/// index order followed by any other members, skipping `count`.
pub fn collection(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let mut indexed: Vec<(usize, &Value)> = Vec::new();
            let mut named: Vec<&Value> = Vec::new();
            for (key, member) in map {
                if key == "count" {
                    continue;
                }
                match key.parse::<usize>() {
                    Ok(i) => indexed.push((i, member)),
                    Err(_) => named.push(member),
                }
            }
            indexed.sort_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, v)| v).chain(named).collect()
        }
        _ => Vec::new(),
    }
}
