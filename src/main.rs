use std::process::ExitCode;

use anyhow::Result;

use pims_season_stats::config::{PipelineConfig, RunStamp};
use pims_season_stats::fetch::HttpFetcher;
use pims_season_stats::guard::{RunOutcome, run_guarded};
use pims_season_stats::logging;
use pims_season_stats::pipeline::{LeagueReport, league_expected_files, run_league};
use pims_season_stats::schedule::FixedDelay;

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let stamp = RunStamp::now();
    let config = PipelineConfig::from_env();
    // A bad environment still has to leave the default file set behind.
    let target = match &config {
        Ok(config) => config.clone(),
        Err(_) => PipelineConfig::default(),
    };
    let expected = league_expected_files(&target, &stamp).unwrap_or_default();

    let outcome = run_guarded(&target.output_dir, &expected, &stamp, || -> Result<LeagueReport> {
        let config = config?;
        let fetcher = HttpFetcher::new(config.request_timeout)?;
        run_league(&fetcher, &config, &FixedDelay(config.request_delay), &stamp)
    });

    match &outcome {
        RunOutcome::Complete(report) => print_summary(report),
        RunOutcome::Fallback { reason } => {
            eprintln!("Run failed, fallback files written to {}", target.output_dir.display());
            eprintln!("Reason: {reason}");
        }
    }
    outcome.exit_code()
}

fn print_summary(report: &LeagueReport) {
    println!("League stats complete");
    println!(
        "Team stats: {}/{} teams",
        report.teams_with_stats, report.teams_total
    );
    println!(
        "Players with stats: {}/{} ({} roster entries)",
        report.players_with_stats, report.player_records, report.roster_players
    );
    if !report.league_collisions.is_empty() {
        println!("Jersey collisions (league): {}", report.league_collisions.len());
    }
    if !report.featured_collisions.is_empty() {
        println!(
            "Jersey collisions (featured team): {}",
            report.featured_collisions.len()
        );
    }
    println!("Files written: {}", report.files.len());
    for path in &report.files {
        println!("  {}", path.display());
    }
    if !report.errors.is_empty() {
        println!("errors: {}", report.errors.len());
        for err in report.errors.iter().take(12) {
            println!("   - {err}");
        }
    }
}
