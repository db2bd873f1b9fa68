use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::Team;
use crate::fetch::{Endpoints, JsonSource};
use crate::lenient::{number_value, value_to_f64};
use crate::season::{GameLog, SeasonSnapshot, extract_season};

/// A team's own season snapshot as reported by the team-stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAggregate {
    pub team: String,
    pub team_id: u32,
    pub abbr: String,
    pub season: u32,
    pub stats: SeasonSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster_error: Option<String>,
}

impl TeamAggregate {
    pub fn unavailable(team: &Team, season: u32, error: impl Into<String>) -> Self {
        Self {
            team: team.name.clone(),
            team_id: team.id,
            abbr: team.abbr.clone(),
            season,
            stats: SeasonSnapshot::empty(),
            error: Some(error.into()),
            roster_error: None,
        }
    }
}

pub fn fetch_team_aggregate(
    source: &dyn JsonSource,
    endpoints: &Endpoints,
    team: &Team,
    season: u32,
) -> TeamAggregate {
    info!("Fetching team stats for {}...", team.name);
    match source.get_json(&endpoints.team_stats(team.id)) {
        Ok(payload) => {
            let selection = extract_season(&payload, season);
            if !selection.has_stats {
                warn!("No {season} season data found for {}", team.name);
                return TeamAggregate::unavailable(
                    team,
                    season,
                    format!("No {season} season data available"),
                );
            }
            TeamAggregate {
                team: team.name.clone(),
                team_id: team.id,
                abbr: team.abbr.clone(),
                season,
                stats: selection.snapshot,
                error: None,
                roster_error: None,
            }
        }
        Err(err) => {
            warn!("Error fetching team stats for {}: {err}", team.name);
            TeamAggregate::unavailable(team, season, err.to_string())
        }
    }
}

/// Per-game fields summed into a player's season totals, in output order.
pub const GAME_TOTAL_FIELDS: &[&str] = &[
    // participation
    "hasParticipated",
    "wasStarter",

    // defense stats
    "tackles",
    "tacklesSolo",
    "tacklesAssisted",
    "tacklesSpecialTeam",
    "tacklesAssistedSpecialTeam",
    "tacklesForLoss",
    "tacklesForLossYards",
    "passesDefended",
    "sacks",
    "sacksForLossYards",
    "safeties",
    "quarterbackHits",

    // fumbles
    "fumbles",
    "fumblesForced",
    "fumblesLost",
    "fumblesOutOfBounds",
    "fumblesRecoveries",
    "fumblesRecoveriesFromOpponents",
    "fumblesRecoveriesOwn",
    "fumblesRecoveriesOwnYards",
    "fumblesReturnsYards",
    "fumblesReturnsYardsLongest",

    // interceptions
    "interceptions",
    "interceptionsReturns",
    "interceptionsReturnsYards",
    "interceptionsReturnsYardsLongest",

    // passing
    "passesAttempted",
    "passesAttemptedYardsAverage",
    "passesIntercepted",
    "passesRating",
    "passesSacked",
    "passesSackedFirstDown",
    "passesSackedSecondDown",
    "passesSackedThirdDown",
    "passesSucceededYardsLongest",
    "passesSucceededPercentage",
    "passesSucceededThirtyPlusYards",

    // rushing and receiving
    "carries",
    "rushingYards",
    "receptions",
    "receivingYards",

    // kicking
    "fieldGoalsAttempted",
    "fieldGoalsAverageYards",
    "fieldGoalsBlocked",
    "defensiveFieldGoalsBlocked",
    "fieldGoalsYards",
    "fieldGoalsMissed",
    "fieldGoalsMissedReturns",
    "fieldGoalsMissedReturnsYards",
    "fieldGoalsMissedReturnsYardsAverage",
    "fieldGoalsMissedReturnsYardsLongest",
    "fieldGoalsSucceeded",
    "fieldGoalsSucceededYardsLongest",
    "fieldGoalsSucceededPercentage",

    // extra points
    "extraPointsAttempted",
    "extraPointsBlocked",
    "defensiveExtraPointsBlocked",
    "extraPointsSucceeded",

    // punting
    "punts",
    "puntingYards",
    "puntingYardsNet",
    "puntingYardsLongest",
    "puntingTouchbacks",
    "puntingKickerReturnsYards",
    "puntingYardsGrossAverage",
    "puntingYardsNetAverage",
    "puntsBlocked",
    "defensivePuntsBlocked",
    "puntingInsideTwenty",

    // kickoffs
    "kickoffs",
    "kickoffsFairCatches",
    "kickoffsYards",
    "kickoffsYardsAverage",
    "kickoffsYardsLongest",
    "kickoffsInsideEndZone",
    "kickoffsInsideTwenty",
    "kickoffsKickerReturnsYards",
    "kickoffsOutOfBounds",
    "kickoffsTouchbacks",

    // kickoff returns
    "kickoffsReturns",
    "kickoffsReturnsYards",
    "kickoffsReturnsYardsAverage",
    "kickoffsReturnsYardsLongest",

    // touchdowns
    "touchdowns",
    "touchdownsFieldGoalsReturns",
    "touchdownsFumblesOwnRecovery",
    "touchdownsFumblesReturn",
    "touchdownsInterceptionsReturns",
    "touchdownsInterceptionsReturnsYardsLongest",
    "touchdownsKickoffsReturns",
    "touchdownsKickoffsReturnsYardsLongest",
    "touchdownsPasses",
    "touchdownsPassesYardsLongest",
    "touchdownsPuntingReturns",
    "touchdownsPuntingReturnsYardsLongest",
    "touchdownsReceptions",
    "touchdownsReceptionsYardsLongest",
    "touchdownsReturns",
    "touchdownsRushing",
    "touchdownsRushingYardsLongest",

    // two point conversions
    "twoPointPassAttempted",
    "twoPointPassSucceeded",
    "twoPointReceptionAttempted",
    "twoPointReceptionSucceeded",
    "twoPointRushAttempted",
    "twoPointRushSucceeded",
    "twoPointDefensiveConversionsAttempted",
    "twoPointDefensiveConversionsSucceeded",
    "twoPointConversionsDefense",

    // penalties
    "penaltiesChargedDefense",
    "penaltiesChargedOffense",
    "penaltiesDeclined",
    "penaltiesForLossYards",
    "firstDownsByPenalties",

    // losses
    "kneels",
    "kneelsYards",
    "losses",
    "lossesYards",

    // returns
    "returnsYards",

    // competitor stats
    "turnovers",
    "turnoversOnDowns",
    "offenseYards",
    "plays",
    "timeOfPossessionSeconds",
    "playYardsAverage",
];

/// Season totals for one player, summed game by game.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTotals {
    pub games: usize,
    values: Vec<f64>,
}

impl SeasonTotals {
    pub fn from_games(games: &[GameLog]) -> Self {
        let mut values = vec![0.0; GAME_TOTAL_FIELDS.len()];
        for game in games {
            let Some(stats) = game.stats() else {
                continue;
            };
            for (slot, field) in values.iter_mut().zip(GAME_TOTAL_FIELDS) {
                if let Some(n) = stats.get(*field).and_then(value_to_f64) {
                    *slot += n;
                }
            }
        }
        Self {
            games: games.len(),
            values,
        }
    }

    pub fn get(&self, field: &str) -> f64 {
        GAME_TOTAL_FIELDS
            .iter()
            .position(|f| *f == field)
            .map(|idx| self.values[idx])
            .unwrap_or(0.0)
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("games".to_string(), Value::from(self.games));
        for (field, value) in GAME_TOTAL_FIELDS.iter().zip(&self.values) {
            out.insert((*field).to_string(), number_value(*value));
        }
        out
    }
}

impl Serialize for SeasonTotals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Team totals summed from players' per-game logs. Not expected to match the
/// team-stats endpoint; see [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTeamTotals {
    pub total_players: usize,
    pub total_games: usize,
    #[serde(serialize_with = "ser_number")]
    pub total_tackles: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_sacks: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_interceptions: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_fumbles_forced: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_passes_defended: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_fumble_recoveries: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_touchdowns: f64,
    #[serde(serialize_with = "ser_number")]
    pub total_yards: f64,
}

fn ser_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    number_value(*value).serialize(serializer)
}

impl DerivedTeamTotals {
    pub fn from_players<'a>(players: impl IntoIterator<Item = &'a SeasonTotals>) -> Self {
        let mut totals = Self::default();
        for player in players {
            totals.total_players += 1;
            if player.games == 0 {
                continue;
            }
            totals.total_games += player.games;
            totals.total_tackles += player.get("tackles");
            totals.total_sacks += player.get("sacks");
            totals.total_interceptions += player.get("interceptions");
            totals.total_fumbles_forced += player.get("fumblesForced");
            totals.total_passes_defended += player.get("passesDefended");
            totals.total_fumble_recoveries += player.get("fumblesRecoveries");
            totals.total_touchdowns += player.get("touchdowns");
            totals.total_yards += player.get("offenseYards");
        }
        totals
    }

    fn pairs(&self) -> [(&'static str, &'static str, f64); 8] {
        [
            ("totalTackles", "tackles", self.total_tackles),
            ("totalSacks", "sacks", self.total_sacks),
            ("totalInterceptions", "interceptions", self.total_interceptions),
            ("totalFumblesForced", "fumblesForced", self.total_fumbles_forced),
            ("totalPassesDefended", "passesDefended", self.total_passes_defended),
            ("totalFumbleRecoveries", "fumblesRecoveries", self.total_fumble_recoveries),
            ("totalTouchdowns", "touchdowns", self.total_touchdowns),
            ("totalYards", "offenseYards", self.total_yards),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disagreement {
    pub field: String,
    pub direct_field: String,
    #[serde(serialize_with = "ser_number")]
    pub derived: f64,
    #[serde(serialize_with = "ser_number")]
    pub direct: f64,
}

/// Compares derived totals with the team's direct snapshot. Fields the
/// snapshot does not carry as numbers are not compared.
pub fn reconcile(derived: &DerivedTeamTotals, direct: &SeasonSnapshot) -> Vec<Disagreement> {
    let mut out = Vec::new();
    for (field, direct_field, derived_value) in derived.pairs() {
        let Some(direct_value) = direct.get(direct_field).and_then(value_to_f64) else {
            continue;
        };
        if (direct_value - derived_value).abs() > f64::EPSILON {
            out.push(Disagreement {
                field: field.to_string(),
                direct_field: direct_field.to_string(),
                derived: derived_value,
                direct: direct_value,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn game(stats: Value) -> GameLog {
        GameLog {
            raw: json!({ "season": 2025, "stats": stats }),
        }
    }

    #[test]
    fn season_totals_sum_known_fields_and_ignore_others() {
        let totals = SeasonTotals::from_games(&[
            game(json!({ "tackles": 3, "unknownField": 99, "sacks": "1" })),
            game(json!({ "tackles": 5, "sacks": 1.5 })),
            GameLog { raw: json!({ "season": 2025 }) },
        ]);
        assert_eq!(totals.games, 3);
        assert_eq!(totals.get("tackles"), 8.0);
        assert_eq!(totals.get("sacks"), 1.5);
        assert_eq!(totals.get("unknownField"), 0.0);
        let map = totals.to_map();
        assert_eq!(map["tackles"], json!(8));
        assert!(map.get("unknownField").is_none());
    }

    #[test]
    fn season_totals_cover_offence_and_special_teams() {
        let totals = SeasonTotals::from_games(&[
            game(json!({ "rushingYards": 120, "passesAttempted": 30, "receptions": 4, "punts": 6 })),
            game(json!({ "rushingYards": 35, "fieldGoalsSucceeded": 2, "kickoffsReturnsYards": 48 })),
        ]);
        assert_eq!(GAME_TOTAL_FIELDS.len(), 127);
        assert_eq!(totals.get("rushingYards"), 155.0);
        assert_eq!(totals.get("punts"), 6.0);
        let map = totals.to_map();
        assert_eq!(map.len(), 128);
        assert_eq!(map["passesAttempted"], json!(30));
        assert_eq!(map["receptions"], json!(4));
        assert_eq!(map["fieldGoalsSucceeded"], json!(2));
        assert_eq!(map["kickoffsReturnsYards"], json!(48));
        assert_eq!(map["carries"], json!(0));
    }

    #[test]
    fn derived_totals_skip_players_without_games_but_count_them() {
        let a = SeasonTotals::from_games(&[game(json!({ "tackles": 3, "interceptions": 1 }))]);
        let b = SeasonTotals::from_games(&[game(json!({ "tackles": 5, "offenseYards": 40 }))]);
        let idle = SeasonTotals::from_games(&[]);
        let totals = DerivedTeamTotals::from_players([&a, &b, &idle]);
        assert_eq!(totals.total_players, 3);
        assert_eq!(totals.total_games, 2);
        assert_eq!(totals.total_tackles, 8.0);
        assert_eq!(totals.total_interceptions, 1.0);
        assert_eq!(totals.total_yards, 40.0);
        let rendered = serde_json::to_value(&totals).unwrap();
        assert_eq!(rendered["totalTackles"], json!(8));
    }

    #[test]
    fn reconcile_flags_only_numeric_mismatches() {
        let totals = DerivedTeamTotals {
            total_tackles: 8.0,
            total_sacks: 2.0,
            ..DerivedTeamTotals::default()
        };
        let direct = SeasonSnapshot::from_map(
            json!({ "tackles": 10, "sacks": 2, "touchdowns": "n/a" })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let diffs = reconcile(&totals, &direct);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "totalTackles");
        assert_eq!(diffs[0].direct, 10.0);
    }
}
