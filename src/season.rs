use serde::Serialize;
use serde_json::{Map, Value};

/// One season's statistics for a player or a team, fields in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SeasonSnapshot(Map<String, Value>);

impl SeasonSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSelection {
    pub snapshot: SeasonSnapshot,
    pub has_stats: bool,
}

impl SeasonSelection {
    pub fn none() -> Self {
        Self {
            snapshot: SeasonSnapshot::empty(),
            has_stats: false,
        }
    }
}

/// The season field must be the target year as a JSON number; `"2025"` or a
/// neighbouring year never matches.
pub fn is_season(value: &Value, season: u32) -> bool {
    value
        .get("season")
        .and_then(Value::as_u64)
        .is_some_and(|s| s == u64::from(season))
}

/// Picks the first entry of `payload.seasons` for `season`. No fallback to
/// another year.
pub fn extract_season(payload: &Value, season: u32) -> SeasonSelection {
    let found = payload
        .get("seasons")
        .and_then(Value::as_array)
        .and_then(|seasons| seasons.iter().find(|entry| is_season(entry, season)))
        .and_then(Value::as_object);

    match found {
        Some(map) => SeasonSelection {
            snapshot: SeasonSnapshot::from_map(map.clone()),
            has_stats: true,
        },
        None => SeasonSelection::none(),
    }
}

/// All season entries for `season` (the team-season report keeps the narrowed list).
pub fn seasons_for(payload: &Value, season: u32) -> Vec<Value> {
    entries_for(payload, "seasons", season)
}

/// One game's contribution for a player.
#[derive(Debug, Clone, PartialEq)]
pub struct GameLog {
    pub raw: Value,
}

impl GameLog {
    pub fn stats(&self) -> Option<&Map<String, Value>> {
        self.raw.get("stats").and_then(Value::as_object)
    }
}

pub fn fixtures_for_season(payload: &Value, season: u32) -> Vec<GameLog> {
    entries_for(payload, "fixtures", season)
        .into_iter()
        .map(|raw| GameLog { raw })
        .collect()
}

fn entries_for(payload: &Value, key: &str, season: u32) -> Vec<Value> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| is_season(item, season))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
