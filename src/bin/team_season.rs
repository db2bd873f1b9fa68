use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use pims_season_stats::config::{PipelineConfig, RunStamp};
use pims_season_stats::fetch::HttpFetcher;
use pims_season_stats::guard::{RunOutcome, run_guarded};
use pims_season_stats::logging;
use pims_season_stats::pipeline::{TeamSeasonReport, run_team_season, team_season_expected_files};
use pims_season_stats::schedule::FixedDelay;

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init();

    let stamp = RunStamp::now();
    let config = PipelineConfig::from_env();
    let target = match &config {
        Ok(config) => config.clone(),
        Err(_) => PipelineConfig::default(),
    };
    let expected = team_season_expected_files(&target, &stamp).unwrap_or_default();

    let outcome = run_guarded(
        &target.output_dir,
        &expected,
        &stamp,
        || -> Result<(TeamSeasonReport, Vec<PathBuf>)> {
            let config = config?;
            let fetcher = HttpFetcher::new(config.request_timeout)?;
            run_team_season(&fetcher, &config, &FixedDelay(config.request_delay), &stamp)
        },
    );

    match &outcome {
        RunOutcome::Complete((report, files)) => {
            println!("{} {} season stats complete", report.team, report.season);
            println!("Players: {}", report.players.len());
            println!("Games played: {}", report.team_stats.total_games);
            println!("Tackles: {}", report.team_stats.total_tackles);
            println!("Sacks: {}", report.team_stats.total_sacks);
            println!("Interceptions: {}", report.team_stats.total_interceptions);
            if !report.disagreements.is_empty() {
                println!(
                    "Derived totals differ from team stats on {} field(s)",
                    report.disagreements.len()
                );
            }
            for path in files {
                println!("  {}", path.display());
            }
        }
        RunOutcome::Fallback { reason } => {
            eprintln!("Run failed, fallback files written to {}", target.output_dir.display());
            eprintln!("Reason: {reason}");
        }
    }
    outcome.exit_code()
}
