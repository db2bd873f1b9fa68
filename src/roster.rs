use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Team;
use crate::fetch::{Endpoints, JsonSource};
use crate::lenient::{value_to_string, value_to_u64};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterDecodeError {
    #[error("unrecognised roster response: expected an array or an object with `rosterplayers`/`players`, got {found}")]
    UnrecognisedShape { found: &'static str },
}

/// Response shapes the roster endpoint is known to return, in the order they are tried.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterShape {
    Bare(Vec<Map<String, Value>>),
    Wrapped { rosterplayers: Vec<Map<String, Value>> },
    Players { players: Vec<Map<String, Value>> },
}

impl RosterShape {
    fn into_rows(self) -> Vec<Map<String, Value>> {
        match self {
            RosterShape::Bare(rows) => rows,
            RosterShape::Wrapped { rosterplayers } => rosterplayers,
            RosterShape::Players { players } => players,
        }
    }
}

/// One roster slot. `fields` keeps every upstream field in authored order; the
/// typed members are read from it once at decode time.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub player_id: Option<u64>,
    pub jersey_no: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub position: Option<String>,
    pub birthdate: Option<String>,
    pub height_ft: Option<String>,
    pub height_in: Option<String>,
    pub weight_lbs: Option<String>,
    pub college: Option<String>,
    pub team: Team,
    fields: Map<String, Value>,
}

impl RosterEntry {
    pub fn from_fields(mut fields: Map<String, Value>, team: &Team) -> Self {
        let text = |key: &str| fields.get(key).and_then(value_to_string);
        let player_id = fields
            .get("player_id")
            .and_then(value_to_u64)
            .or_else(|| fields.get("id").and_then(value_to_u64));
        // Jerseys stay text: "0" and "00" are different numbers.
        let jersey_no = text("jersey_no").map(|jersey| jersey.trim().to_string());

        let entry_firstname = text("firstname");
        let entry_lastname = text("lastname");
        let position = text("position");
        let birthdate = text("birthdate");
        let height_ft = text("height_ft");
        let height_in = text("height_in");
        let weight_lbs = text("weight_lbs");
        let college = text("college");

        fields.insert("team_name".to_string(), Value::from(team.name.clone()));
        fields.insert("team_id".to_string(), Value::from(team.id));
        fields.insert("team_abbr".to_string(), Value::from(team.abbr.clone()));

        Self {
            player_id,
            jersey_no,
            firstname: entry_firstname,
            lastname: entry_lastname,
            position,
            birthdate,
            height_ft,
            height_in,
            weight_lbs,
            college,
            team: team.clone(),
            fields,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.firstname.as_deref().unwrap_or_default(),
            self.lastname.as_deref().unwrap_or_default()
        );
        let trimmed = name.trim();
        if trimmed.is_empty() {
            "Unknown Player".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

pub fn decode_roster(payload: Value, team: &Team) -> Result<Vec<RosterEntry>, RosterDecodeError> {
    let found = json_kind(&payload);
    let shape = serde_json::from_value::<RosterShape>(payload)
        .map_err(|_| RosterDecodeError::UnrecognisedShape { found })?;
    Ok(shape
        .into_rows()
        .into_iter()
        .map(|row| RosterEntry::from_fields(row, team))
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array of non-objects",
        Value::Object(_) => "an object without a roster array",
    }
}

#[derive(Debug, Clone)]
pub struct TeamRoster {
    pub team: Team,
    pub entries: Vec<RosterEntry>,
    pub error: Option<String>,
}

/// Never fails: a team whose roster cannot be fetched or decoded yields an
/// empty roster carrying the reason.
pub fn resolve_roster(source: &dyn JsonSource, endpoints: &Endpoints, team: &Team) -> TeamRoster {
    info!("Fetching roster for {}...", team.name);
    let url = endpoints.roster(team.id);
    let outcome = source
        .get_json(&url)
        .map_err(|err| err.to_string())
        .and_then(|payload| decode_roster(payload, team).map_err(|err| err.to_string()));

    match outcome {
        Ok(entries) => {
            info!("Found {} players in {} roster", entries.len(), team.name);
            TeamRoster {
                team: team.clone(),
                entries,
                error: None,
            }
        }
        Err(err) => {
            warn!("Error fetching roster for {}: {err}", team.name);
            TeamRoster {
                team: team.clone(),
                entries: Vec::new(),
                error: Some(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn wpg() -> Team {
        Team::new(20, "Winnipeg Blue Bombers", "WPG")
    }

    #[test]
    fn decodes_bare_array() {
        let rows = decode_roster(json!([{ "player_id": 1, "jersey_no": 5 }]), &wpg()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_id, Some(1));
        assert_eq!(rows[0].jersey_no.as_deref(), Some("5"));
    }

    #[test]
    fn decodes_rosterplayers_wrapper() {
        let payload = json!({ "rosterplayers": [{ "player_id": "17", "firstname": "Zach" }] });
        let rows = decode_roster(payload, &wpg()).unwrap();
        assert_eq!(rows[0].player_id, Some(17));
        assert_eq!(rows[0].firstname.as_deref(), Some("Zach"));
    }

    #[test]
    fn decodes_players_wrapper_when_rosterplayers_is_not_an_array() {
        let payload = json!({ "rosterplayers": null, "players": [{ "id": 9 }] });
        let rows = decode_roster(payload, &wpg()).unwrap();
        assert_eq!(rows[0].player_id, Some(9));
    }

    #[test]
    fn unknown_shape_is_an_explicit_error() {
        let err = decode_roster(json!({ "data": [] }), &wpg()).unwrap_err();
        assert_eq!(
            err,
            RosterDecodeError::UnrecognisedShape {
                found: "an object without a roster array"
            }
        );
    }

    #[test]
    fn entries_are_tagged_with_team_after_upstream_fields() {
        let rows = decode_roster(json!([{ "lastname": "Collaros", "team_id": 99 }]), &wpg()).unwrap();
        let keys: Vec<&str> = rows[0].fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lastname", "team_id", "team_name", "team_abbr"]);
        assert_eq!(rows[0].fields()["team_id"], json!(20));
        assert_eq!(rows[0].display_name(), "Collaros");
    }

    #[test]
    fn jersey_text_is_kept_as_authored() {
        let rows = decode_roster(
            json!([{ "jersey_no": "00" }, { "jersey_no": 0 }, { "jersey_no": " A1 " }, { "jersey_no": "" }]),
            &wpg(),
        )
        .unwrap();
        let jerseys: Vec<Option<&str>> = rows.iter().map(|r| r.jersey_no.as_deref()).collect();
        assert_eq!(jerseys, vec![Some("00"), Some("0"), Some("A1"), None]);
    }

    #[test]
    fn nameless_entry_is_unknown_player() {
        let rows = decode_roster(json!([{}]), &wpg()).unwrap();
        assert_eq!(rows[0].display_name(), "Unknown Player");
        assert_eq!(rows[0].player_id, None);
    }
}
