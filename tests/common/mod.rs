#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use pims_season_stats::config::{PipelineConfig, RunStamp};
use pims_season_stats::fetch::{Endpoints, FetchError, JsonSource};

pub const API_BASE: &str = "http://pims.test/api";

pub fn read_fixture(name: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should be valid json")
}

/// Canned upstream: answers from a url table and records every request.
#[derive(Default)]
pub struct FakeApi {
    responses: HashMap<String, Result<Value, FetchError>>,
    requests: RefCell<Vec<String>>,
}

impl FakeApi {
    pub fn respond(&mut self, url: String, body: Value) {
        self.responses.insert(url, Ok(body));
    }

    pub fn fail(&mut self, url: String, err: FetchError) {
        self.responses.insert(url, Err(err));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl JsonSource for FakeApi {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.responses.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        })
    }
}

pub fn endpoints() -> Endpoints {
    Endpoints::new(API_BASE)
}

/// Whole league: WPG, BC and CGY have players, the rest have empty rosters.
/// CGY's only player fails with a 500.
pub fn league_api() -> FakeApi {
    let ep = endpoints();
    let mut api = FakeApi::default();
    for (id, _, _) in team_ids() {
        api.respond(
            ep.team_stats(id),
            json!({ "seasons": [{ "season": 2025, "games": 18, "tackles": 250 }] }),
        );
        api.respond(ep.roster(id), json!([]));
    }
    api.respond(ep.team_stats(20), read_fixture("team_stats_wpg.json"));
    api.respond(ep.roster(20), read_fixture("roster_wpg.json"));
    api.respond(ep.roster(1), read_fixture("roster_bc.json"));
    api.respond(ep.roster(6), read_fixture("roster_cgy.json"));
    for id in [101u64, 102, 103, 201] {
        api.respond(ep.player_stats(id), read_fixture(&format!("player_{id}.json")));
    }
    api.fail(
        ep.player_stats(301),
        FetchError::HttpStatus {
            url: ep.player_stats(301),
            status: 500,
        },
    );
    api
}

pub fn team_ids() -> Vec<(u32, String, String)> {
    PipelineConfig::default()
        .teams
        .into_iter()
        .map(|team| (team.id, team.name, team.abbr))
        .collect()
}

pub fn stamp() -> RunStamp {
    RunStamp::fixed(Utc.with_ymd_and_hms(2025, 10, 3, 12, 0, 0).unwrap())
}

/// Fresh, empty output directory unique to one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pims_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

pub fn config_for(dir: &PathBuf) -> PipelineConfig {
    PipelineConfig {
        api_base: API_BASE.to_string(),
        output_dir: dir.clone(),
        ..PipelineConfig::default()
    }
}

pub fn read_json(dir: &PathBuf, name: &str) -> Value {
    let raw = fs::read_to_string(dir.join(name)).expect("output file should exist");
    serde_json::from_str(&raw).expect("output should be valid json")
}
