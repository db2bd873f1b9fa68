use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::fetch::{Endpoints, JsonSource};
use crate::roster::{RosterEntry, TeamRoster};
use crate::schedule::Paced;
use crate::season::{SeasonSelection, extract_season};

/// A roster entry with its season snapshot merged on top. Serialises as one
/// flat object: roster fields, season fields (same names overwrite), then
/// `player_name`, `has_stats` and, for failed fetches, `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player_id: Option<u64>,
    pub player_name: String,
    pub jersey_no: Option<String>,
    pub team_id: u32,
    pub has_stats: bool,
    pub error: Option<String>,
    fields: Map<String, Value>,
}

impl PlayerRecord {
    pub fn flatten(entry: &RosterEntry, selection: SeasonSelection) -> Self {
        let mut fields = entry.fields().clone();
        for (key, value) in selection.snapshot.into_map() {
            fields.insert(key, value);
        }
        Self {
            player_id: entry.player_id,
            player_name: entry.display_name(),
            jersey_no: entry.jersey_no.clone(),
            team_id: entry.team.id,
            has_stats: selection.has_stats,
            error: None,
            fields,
        }
    }

    pub fn stub(entry: &RosterEntry, error: impl Into<String>) -> Self {
        let mut record = Self::flatten(entry, SeasonSelection::none());
        record.error = Some(error.into());
        record
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut out = self.fields.clone();
        out.insert("player_name".to_string(), Value::from(self.player_name.clone()));
        out.insert("has_stats".to_string(), Value::Bool(self.has_stats));
        if let Some(err) = &self.error {
            out.insert("error".to_string(), Value::from(err.clone()));
        }
        out
    }
}

impl Serialize for PlayerRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

pub fn fetch_player(
    source: &dyn JsonSource,
    endpoints: &Endpoints,
    entry: &RosterEntry,
    player_id: u64,
    season: u32,
) -> PlayerRecord {
    match source.get_json(&endpoints.player_stats(player_id)) {
        Ok(payload) => {
            let selection = extract_season(&payload, season);
            debug!(
                player_id,
                has_stats = selection.has_stats,
                "fetched stats for {}",
                entry.display_name()
            );
            PlayerRecord::flatten(entry, selection)
        }
        Err(err) => {
            warn!(
                "Error fetching stats for player {} (ID: {player_id}): {err}",
                entry.display_name()
            );
            PlayerRecord::stub(entry, err.to_string())
        }
    }
}

/// Fetches every roster entry that has a player id, one request at a time,
/// in roster order. A failed player becomes a stub and the loop continues.
pub fn collect_team_players(
    source: &dyn JsonSource,
    endpoints: &Endpoints,
    season: u32,
    roster: &TeamRoster,
    paced: &Paced<'_>,
) -> Vec<PlayerRecord> {
    let fetchable: Vec<(&RosterEntry, u64)> = roster
        .entries
        .iter()
        .filter_map(|entry| match entry.player_id {
            Some(id) => Some((entry, id)),
            None => {
                warn!(
                    "Skipping {} player without ID: {}",
                    roster.team.abbr,
                    entry.display_name()
                );
                None
            }
        })
        .collect();

    paced.map(&fetchable, |(entry, id)| {
        fetch_player(source, endpoints, entry, *id, season)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JerseyCollision {
    pub jersey_no: String,
    pub replaced: String,
    pub replaced_by: String,
}

/// Jersey as printed upstream. Numeric jerseys sort by value with the text as
/// tie-break, so `"0"` and `"00"` are distinct keys; anything else sorts after
/// the numbers, by text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JerseyKey(String);

impl JerseyKey {
    pub fn new(jersey: &str) -> Self {
        Self(jersey.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for JerseyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for JerseyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for JerseyKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Players with stats keyed by jersey. A later record with the same jersey
/// replaces the earlier one; each replacement is recorded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct JerseyMap {
    entries: BTreeMap<JerseyKey, PlayerRecord>,
    #[serde(skip)]
    collisions: Vec<JerseyCollision>,
}

impl JerseyMap {
    pub fn build<'a>(records: impl IntoIterator<Item = &'a PlayerRecord>) -> Self {
        let mut map = Self::default();
        for record in records {
            if !record.has_stats {
                continue;
            }
            let Some(jersey) = record.jersey_no.as_deref() else {
                debug!("{} has no jersey, left out of jersey map", record.player_name);
                continue;
            };
            if let Some(previous) = map.entries.insert(JerseyKey::new(jersey), record.clone()) {
                warn!(
                    "Jersey #{jersey} collision: {} replaced by {}",
                    previous.player_name, record.player_name
                );
                map.collisions.push(JerseyCollision {
                    jersey_no: jersey.to_string(),
                    replaced: previous.player_name,
                    replaced_by: record.player_name.clone(),
                });
            }
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, jersey: &str) -> Option<&PlayerRecord> {
        self.entries.get(&JerseyKey::new(jersey))
    }

    pub fn jerseys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(JerseyKey::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.entries.values()
    }

    pub fn collisions(&self) -> &[JerseyCollision] {
        &self.collisions
    }
}
