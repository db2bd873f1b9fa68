mod common;

use serde_json::json;

use pims_season_stats::config::Team;
use pims_season_stats::fetch::FetchError;
use pims_season_stats::roster::{RosterDecodeError, decode_roster, resolve_roster};

use common::{FakeApi, endpoints, read_fixture};

fn team(id: u32, name: &str, abbr: &str) -> Team {
    Team::new(id, name, abbr)
}

#[test]
fn decodes_rosterplayers_fixture() {
    let wpg = team(20, "Winnipeg Blue Bombers", "WPG");
    let entries = decode_roster(read_fixture("roster_wpg.json"), &wpg).expect("fixture should decode");
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].player_id, Some(101));
    assert_eq!(entries[1].jersey_no.as_deref(), Some("5"));
    assert_eq!(entries[3].player_id, None);
    assert_eq!(entries[0].fields()["team_name"], json!("Winnipeg Blue Bombers"));
}

#[test]
fn decodes_bare_array_fixture() {
    let bc = team(1, "BC Lions", "BC");
    let entries = decode_roster(read_fixture("roster_bc.json"), &bc).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].display_name(), "Justin McInnis");
}

#[test]
fn decodes_players_fixture_with_id_fallback() {
    let cgy = team(6, "Calgary Stampeders", "CGY");
    let entries = decode_roster(read_fixture("roster_cgy.json"), &cgy).unwrap();
    assert_eq!(entries[0].player_id, Some(301));
    assert_eq!(entries[0].team.abbr, "CGY");
}

#[test]
fn scalar_payload_is_rejected() {
    let err = decode_roster(json!("maintenance"), &team(1, "BC Lions", "BC")).unwrap_err();
    assert_eq!(err, RosterDecodeError::UnrecognisedShape { found: "a string" });
}

#[test]
fn unresolvable_roster_is_empty_with_reason() {
    let ottawa = team(13, "Ottawa Redblacks", "OTT");
    let ep = endpoints();
    let mut api = FakeApi::default();
    api.respond(ep.roster(13), json!({ "data": [] }));
    let roster = resolve_roster(&api, &ep, &ottawa);
    assert!(roster.entries.is_empty());
    assert!(roster.error.as_deref().is_some_and(|err| err.starts_with("unrecognised roster response")));

    let url = ep.roster(13);
    api.fail(url.clone(), FetchError::Parse { url, message: "expected value".to_string() });
    let roster = resolve_roster(&api, &ep, &ottawa);
    assert!(roster.error.as_deref().is_some_and(|err| err.starts_with("failed to parse JSON")));
}
