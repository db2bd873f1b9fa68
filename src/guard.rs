use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::RunStamp;
use crate::output::write_atomic;
use crate::xml::fallback_xml;

pub const FALLBACK_MESSAGE: &str = "Data temporarily unavailable - please try again later";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing required files: {}", .0.join(", "))]
pub struct MissingFiles(pub Vec<String>);

#[derive(Debug, Serialize)]
struct FallbackDocument<'a> {
    message: &'a str,
    timestamp: String,
    status: &'static str,
}

pub fn validate(dir: &Path, expected: &[String]) -> Result<(), MissingFiles> {
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !dir.join(name.as_str()).is_file())
        .cloned()
        .collect();
    if missing.is_empty() {
        info!("All {} required files validated", expected.len());
        Ok(())
    } else {
        Err(MissingFiles(missing))
    }
}

pub fn fallback_json(stamp: &RunStamp) -> Result<String> {
    let doc = FallbackDocument {
        message: FALLBACK_MESSAGE,
        timestamp: stamp.timestamp(),
        status: "fallback",
    };
    serde_json::to_string_pretty(&doc).context("render fallback json")
}

/// Overwrites every expected file with the stub document for its format.
/// Keeps going past individual failures and reports the first one.
pub fn write_fallback(dir: &Path, expected: &[String], stamp: &RunStamp) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;
    let json = fallback_json(stamp)?;
    let xml = fallback_xml(FALLBACK_MESSAGE, &stamp.timestamp());

    let mut first_err = None;
    for name in expected {
        let contents = if name.ends_with(".xml") { &xml } else { &json };
        match write_atomic(&dir.join(name), contents) {
            Ok(()) => info!("Created fallback file: {name}"),
            Err(err) => {
                error!("Failed to create fallback file {name}: {err:#}");
                first_err.get_or_insert(err);
            }
        }
    }
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[derive(Debug)]
pub enum RunOutcome<T> {
    Complete(T),
    Fallback { reason: String },
}

impl<T> RunOutcome<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete(_))
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_complete() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Runs `run` and guarantees that afterwards every expected file exists:
/// an error, a panic, or a missing file replaces the whole set with stubs.
pub fn run_guarded<T>(
    dir: &Path,
    expected: &[String],
    stamp: &RunStamp,
    run: impl FnOnce() -> Result<T>,
) -> RunOutcome<T> {
    let reason = match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(value)) => match validate(dir, expected) {
            Ok(()) => return RunOutcome::Complete(value),
            Err(missing) => {
                error!("File validation failed: {missing}");
                missing.to_string()
            }
        },
        Ok(Err(err)) => {
            error!("Run failed: {err:#}");
            format!("{err:#}")
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Run panicked: {message}");
            format!("panic: {message}")
        }
    };

    warn!("Creating fallback files...");
    if let Err(err) = write_fallback(dir, expected, stamp) {
        error!("Fallback generation incomplete: {err:#}");
    }
    RunOutcome::Fallback { reason }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_message_lists_names() {
        let err = MissingFiles(vec!["a.json".to_string(), "b.xml".to_string()]);
        assert_eq!(err.to_string(), "missing required files: a.json, b.xml");
    }

    #[test]
    fn panic_message_reads_str_and_string() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
