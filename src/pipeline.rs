use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{PipelineConfig, RunStamp, Team};
use crate::fetch::{Endpoints, JsonSource};
use crate::output::{Artifact, expected_files, write_artifact};
use crate::player::{JerseyCollision, JerseyMap, PlayerRecord, collect_team_players};
use crate::roster::{RosterEntry, TeamRoster, resolve_roster};
use crate::schedule::{DelayPolicy, Paced};
use crate::season::{fixtures_for_season, seasons_for};
use crate::team::{
    DerivedTeamTotals, Disagreement, SeasonTotals, TeamAggregate, fetch_team_aggregate, reconcile,
};

// ---------------------------------------------------------------------------
// League snapshot: every team's own stats plus jersey-keyed player maps.
// ---------------------------------------------------------------------------

pub fn league_stems(config: &PipelineConfig) -> Result<Vec<String>> {
    let season = config.season;
    let slug = config.featured()?.slug();
    Ok(vec![
        format!("all_teams_{season}_stats"),
        format!("team_{slug}_{season}_stats"),
        format!("all_players_{season}_stats"),
        format!("{slug}_players_{season}_stats"),
    ])
}

pub fn league_expected_files(config: &PipelineConfig, stamp: &RunStamp) -> Result<Vec<String>> {
    Ok(expected_files(&league_stems(config)?, stamp))
}

#[derive(Debug, Clone)]
pub struct LeagueData {
    pub teams: Vec<TeamAggregate>,
    pub rosters: Vec<TeamRoster>,
    pub players: Vec<PlayerRecord>,
}

/// Fetches everything for the league: every team's stats first, then each
/// team's roster followed by its players. Per-team and per-player failures
/// are folded into the data; this never fails.
pub fn collect_league(
    source: &dyn JsonSource,
    config: &PipelineConfig,
    delay: &dyn DelayPolicy,
) -> LeagueData {
    let endpoints = Endpoints::new(&config.api_base);
    let paced = Paced::new(delay);

    info!("=== FETCHING TEAM STATS ===");
    let mut teams = paced.map(&config.teams, |team| {
        fetch_team_aggregate(source, &endpoints, team, config.season)
    });

    info!("=== FETCHING PLAYER DATA ===");
    let mut rosters = Vec::with_capacity(config.teams.len());
    let mut players = Vec::new();
    for team in &config.teams {
        delay.pause();
        let roster = resolve_roster(source, &endpoints, team);
        if !roster.entries.is_empty() {
            delay.pause();
            players.extend(collect_team_players(
                source,
                &endpoints,
                config.season,
                &roster,
                &paced,
            ));
        }
        rosters.push(roster);
    }

    for (aggregate, roster) in teams.iter_mut().zip(&rosters) {
        aggregate.roster_error = roster.error.clone();
    }

    LeagueData {
        teams,
        rosters,
        players,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueReport {
    pub teams_total: usize,
    pub teams_with_stats: usize,
    pub roster_players: usize,
    pub player_records: usize,
    pub players_with_stats: usize,
    pub league_collisions: Vec<JerseyCollision>,
    pub featured_collisions: Vec<JerseyCollision>,
    pub errors: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Jersey maps for the whole league and for the featured team.
#[derive(Debug, Clone)]
pub struct LeagueMaps {
    pub league: JerseyMap,
    pub featured: JerseyMap,
}

impl LeagueMaps {
    pub fn build(data: &LeagueData, featured: &Team) -> Self {
        Self {
            league: JerseyMap::build(&data.players),
            featured: JerseyMap::build(
                data.players
                    .iter()
                    .filter(|record| record.team_id == featured.id),
            ),
        }
    }
}

pub fn league_artifacts(
    config: &PipelineConfig,
    data: &LeagueData,
    maps: &LeagueMaps,
) -> Result<Vec<Artifact>> {
    let season = config.season;
    let featured = config.featured()?;
    let stems = league_stems(config)?;

    let featured_aggregate = data
        .teams
        .iter()
        .find(|aggregate| aggregate.team_id == featured.id)
        .cloned()
        .unwrap_or_else(|| {
            TeamAggregate::unavailable(
                featured,
                season,
                format!("Failed to fetch {} team stats", featured.name),
            )
        });

    let teams_root = format!("Teams{season}Stats");
    let team_root = format!("Team{season}Stats");
    let players_root = format!("Players{season}Stats");
    Ok(vec![
        Artifact::document(&stems[0], &data.teams, &teams_root, "Team")?,
        Artifact::document(&stems[1], &featured_aggregate, &team_root, "Team")?,
        Artifact::jersey_map(&stems[2], &maps.league, &players_root, "Player")?,
        Artifact::jersey_map(&stems[3], &maps.featured, &players_root, "Player")?,
    ])
}

pub fn run_league(
    source: &dyn JsonSource,
    config: &PipelineConfig,
    delay: &dyn DelayPolicy,
    stamp: &RunStamp,
) -> Result<LeagueReport> {
    let featured = config.featured()?;
    let data = collect_league(source, config, delay);
    let maps = LeagueMaps::build(&data, featured);
    let artifacts = league_artifacts(config, &data, &maps)?;

    info!("=== WRITING FILES ===");
    let mut files = Vec::new();
    for artifact in &artifacts {
        files.extend(write_artifact(&config.output_dir, artifact, stamp)?);
    }

    let mut errors = Vec::new();
    for aggregate in &data.teams {
        if let Some(err) = &aggregate.error {
            errors.push(format!("{} team stats: {err}", aggregate.abbr));
        }
        if let Some(err) = &aggregate.roster_error {
            errors.push(format!("{} roster: {err}", aggregate.abbr));
        }
    }
    for record in &data.players {
        if let Some(err) = &record.error {
            errors.push(format!("player {}: {err}", record.player_name));
        }
    }

    let report = LeagueReport {
        teams_total: data.teams.len(),
        teams_with_stats: data.teams.iter().filter(|t| t.error.is_none()).count(),
        roster_players: data.rosters.iter().map(|r| r.entries.len()).sum(),
        player_records: data.players.len(),
        players_with_stats: data.players.iter().filter(|p| p.has_stats).count(),
        league_collisions: maps.league.collisions().to_vec(),
        featured_collisions: maps.featured.collisions().to_vec(),
        errors,
        files,
    };
    info!(
        "Team stats: {}/{} teams successful",
        report.teams_with_stats, report.teams_total
    );
    info!(
        "Player stats: {}/{} players with stats",
        report.players_with_stats, report.roster_players
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Team season report: one team, totals derived from per-game logs.
// ---------------------------------------------------------------------------

const NOT_AVAILABLE: &str = "N/A";

pub fn team_season_stem(team: &Team, season: u32) -> String {
    format!("{}_{season}_season_stats", team.slug())
}

pub fn team_season_expected_files(config: &PipelineConfig, stamp: &RunStamp) -> Result<Vec<String>> {
    let team = config.featured()?;
    Ok(expected_files(&[team_season_stem(team, config.season)], stamp))
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSeasonLine {
    pub player_id: u64,
    pub name: String,
    pub position: String,
    pub jersey: String,
    pub birthdate: String,
    pub height_ft: String,
    pub height_in: String,
    pub weight_lbs: String,
    pub college: String,
    #[serde(rename = "gamesPlayed")]
    pub games_played: usize,
    #[serde(rename = "seasonTotals")]
    pub season_totals: SeasonTotals,
}

impl PlayerSeasonLine {
    fn new(entry: &RosterEntry, player_id: u64, totals: SeasonTotals) -> Self {
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            player_id,
            name: entry.display_name(),
            position: or_na(&entry.position),
            jersey: or_na(&entry.jersey_no),
            birthdate: or_na(&entry.birthdate),
            height_ft: or_na(&entry.height_ft),
            height_in: or_na(&entry.height_in),
            weight_lbs: or_na(&entry.weight_lbs),
            college: or_na(&entry.college),
            games_played: totals.games,
            season_totals: totals,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSeasonReport {
    pub team: String,
    pub team_id: u32,
    pub abbr: String,
    pub season: u32,
    pub generated_at: String,
    pub team_stats: DerivedTeamTotals,
    pub direct_team_stats: TeamAggregate,
    pub disagreements: Vec<Disagreement>,
    pub players: Vec<PlayerSeasonLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub fn collect_team_season(
    source: &dyn JsonSource,
    config: &PipelineConfig,
    delay: &dyn DelayPolicy,
    stamp: &RunStamp,
) -> Result<TeamSeasonReport> {
    let team = config.featured()?;
    let season = config.season;
    let endpoints = Endpoints::new(&config.api_base);
    let paced = Paced::new(delay);

    let roster = resolve_roster(source, &endpoints, team);
    let mut errors: Vec<String> = roster.error.iter().map(|err| format!("roster: {err}")).collect();

    let fetchable: Vec<(&RosterEntry, u64)> = roster
        .entries
        .iter()
        .filter_map(|entry| entry.player_id.map(|id| (entry, id)))
        .collect();
    info!("Fetching individual stats for {} players...", fetchable.len());

    let total = fetchable.len();
    let mut position = 0usize;
    let fetched = paced.map(&fetchable, |(entry, id)| {
        position += 1;
        info!("Fetching stats for player {position}/{total} (ID: {id})");
        source
            .get_json(&endpoints.player_stats(*id))
            .map(|payload| (*entry, *id, payload))
            .map_err(|err| {
                warn!("Error fetching stats for player {id}: {err}");
                format!("player {id}: {err}")
            })
    });

    let mut players = Vec::new();
    for outcome in fetched {
        match outcome {
            Ok((entry, id, payload)) => {
                if let Some(line) = season_line(entry, id, &payload, season) {
                    players.push(line);
                }
            }
            Err(err) => errors.push(err),
        }
    }
    info!(
        "Successfully fetched stats for {} players with {season} data",
        players.len()
    );

    let team_stats = DerivedTeamTotals::from_players(players.iter().map(|p| &p.season_totals));

    delay.pause();
    let direct_team_stats = fetch_team_aggregate(source, &endpoints, team, season);
    let disagreements = if direct_team_stats.error.is_none() {
        reconcile(&team_stats, &direct_team_stats.stats)
    } else {
        Vec::new()
    };
    for diff in &disagreements {
        warn!(
            "{} derived {} = {} but team stats {} = {}",
            team.abbr, diff.field, diff.derived, diff.direct_field, diff.direct
        );
    }

    Ok(TeamSeasonReport {
        team: team.name.clone(),
        team_id: team.id,
        abbr: team.abbr.clone(),
        season,
        generated_at: stamp.timestamp(),
        team_stats,
        direct_team_stats,
        disagreements,
        players,
        errors,
    })
}

/// Players with neither a season entry nor a game for the target season are dropped.
fn season_line(entry: &RosterEntry, id: u64, payload: &Value, season: u32) -> Option<PlayerSeasonLine> {
    let games = fixtures_for_season(payload, season);
    if games.is_empty() && seasons_for(payload, season).is_empty() {
        return None;
    }
    Some(PlayerSeasonLine::new(entry, id, SeasonTotals::from_games(&games)))
}

pub fn run_team_season(
    source: &dyn JsonSource,
    config: &PipelineConfig,
    delay: &dyn DelayPolicy,
    stamp: &RunStamp,
) -> Result<(TeamSeasonReport, Vec<PathBuf>)> {
    let report = collect_team_season(source, config, delay, stamp)?;
    let team = config.featured()?;
    let artifact = Artifact::document(
        &team_season_stem(team, config.season),
        &report,
        &format!("{}{}SeasonStats", team.abbr, config.season),
        "Player",
    )?;
    let files = write_artifact(&config.output_dir, &artifact, stamp)?;
    Ok((report, files))
}
