use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub const DEFAULT_API_BASE: &str = "https://echo.pims.cfl.ca/api";
pub const DEFAULT_OUTPUT_DIR: &str = "public";
pub const DEFAULT_SEASON: u32 = 2025;
pub const DEFAULT_FEATURED_TEAM: &str = "WPG";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

const CFL_TEAMS: &[(u32, &str, &str)] = &[
    (20, "Winnipeg Blue Bombers", "WPG"),
    (1, "BC Lions", "BC"),
    (6, "Calgary Stampeders", "CGY"),
    (7, "Edmonton Elks", "EDM"),
    (8, "Hamilton Tiger Cats", "HAM"),
    (11, "Montreal Alouettes", "MTL"),
    (13, "Ottawa Redblacks", "OTT"),
    (17, "Saskatchewan Roughriders", "SSK"),
    (19, "Toronto Argonauts", "TOR"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub abbr: String,
}

impl Team {
    pub fn new(id: u32, name: &str, abbr: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            abbr: abbr.to_string(),
        }
    }

    /// Lowercase abbreviation used in artifact names.
    pub fn slug(&self) -> String {
        self.abbr.to_ascii_lowercase()
    }
}

pub fn default_teams() -> Vec<Team> {
    CFL_TEAMS
        .iter()
        .map(|(id, name, abbr)| Team::new(*id, name, abbr))
        .collect()
}

/// Settings for one pipeline run. Built once and only ever borrowed.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_base: String,
    pub output_dir: PathBuf,
    pub season: u32,
    pub teams: Vec<Team>,
    pub featured_team: String,
    pub request_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            season: DEFAULT_SEASON,
            teams: default_teams(),
            featured_team: DEFAULT_FEATURED_TEAM.to_string(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(base) = env_string("PIMS_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(dir) = env_string("PIMS_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(season) = env_parse::<u32>("PIMS_SEASON") {
            config.season = season;
        }
        if let Some(abbr) = env_string("PIMS_FEATURED_TEAM") {
            config.featured_team = abbr.to_ascii_uppercase();
        }
        if let Some(ms) = env_parse::<u64>("PIMS_REQUEST_DELAY_MS") {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("PIMS_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        config.featured()?;
        Ok(config)
    }

    pub fn featured(&self) -> Result<&Team> {
        self.teams
            .iter()
            .find(|team| team.abbr.eq_ignore_ascii_case(&self.featured_team))
            .ok_or_else(|| {
                anyhow!(
                    "featured team {} is not in the team list",
                    self.featured_team
                )
            })
    }
}

fn env_string(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|raw| raw.parse::<T>().ok())
}

/// Clock reading for one run; dated file names and `generated_at` stamps come from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp {
    pub at: DateTime<Utc>,
}

impl RunStamp {
    pub fn now() -> Self {
        Self { at: Utc::now() }
    }

    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    pub fn date(&self) -> NaiveDate {
        self.at.date_naive()
    }

    pub fn date_label(&self) -> String {
        self.date().format("%Y-%m-%d").to_string()
    }

    pub fn timestamp(&self) -> String {
        self.at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn default_team_order_starts_with_winnipeg() {
        let teams = default_teams();
        assert_eq!(teams.len(), 9);
        assert_eq!(teams[0].abbr, "WPG");
        assert_eq!(teams[8].abbr, "TOR");
    }

    #[test]
    fn featured_team_lookup_is_case_insensitive() {
        let config = PipelineConfig {
            featured_team: "ssk".to_string(),
            ..PipelineConfig::default()
        };
        assert_eq!(config.featured().expect("known team").id, 17);
    }

    #[test]
    fn unknown_featured_team_is_an_error() {
        let config = PipelineConfig {
            featured_team: "XYZ".to_string(),
            ..PipelineConfig::default()
        };
        assert!(config.featured().is_err());
    }

    #[test]
    fn run_stamp_formats_date_and_timestamp() {
        let stamp = RunStamp::fixed(Utc.with_ymd_and_hms(2025, 9, 1, 6, 30, 0).unwrap());
        assert_eq!(stamp.date_label(), "2025-09-01");
        assert_eq!(stamp.timestamp(), "2025-09-01T06:30:00.000Z");
    }
}
