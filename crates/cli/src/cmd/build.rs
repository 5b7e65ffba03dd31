//! Implementation of the `extbuild build` command.
//!
//! Loads the build file, runs every target through translate and compile/link,
//! and reports one line per target.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use extbuild_lib::{BuildOutcome, BuildResult, LanguageLevel, all_succeeded};

use super::{load_config, runtime};
use crate::output::{
  OutputFormat, format_duration, print_error, print_json, print_stat, print_success, print_warning, symbols,
};

#[derive(Serialize)]
struct BuildReport<'a> {
  success: bool,
  language_level: LanguageLevel,
  build_dir: &'a Path,
  duration_ms: u128,
  results: &'a [BuildResult],
}

/// Execute the build command.
///
/// Command-line overrides win over the build file. Returns a failure exit code
/// when any target fails; per-target errors are printed, not propagated.
pub fn cmd_build(
  config_path: &Path,
  language_level: Option<LanguageLevel>,
  build_dir: Option<PathBuf>,
  format: OutputFormat,
) -> Result<ExitCode> {
  let mut config = load_config(config_path)?;
  if let Some(level) = language_level {
    config.language_level = level;
  }
  if let Some(dir) = build_dir {
    config.build_dir = dir;
  }
  debug!(language_level = %config.language_level, build_dir = ?config.build_dir, "resolved build settings");

  if config.targets.is_empty() && !format.is_json() {
    print_warning(&format!("No targets declared in {}", config_path.display()));
  }

  let orchestrator = config.orchestrator();
  let rt = runtime()?;
  let started = Instant::now();
  let results = rt
    .block_on(orchestrator.build(&config.targets, config.language_level))
    .context("Build rejected")?;
  let elapsed = started.elapsed();
  let success = all_succeeded(&results);

  if format.is_json() {
    print_json(&BuildReport {
      success,
      language_level: config.language_level,
      build_dir: &config.build_dir,
      duration_ms: elapsed.as_millis(),
      results: &results,
    })?;
  } else {
    for result in &results {
      match &result.outcome {
        BuildOutcome::Succeeded { artifact } => {
          print_success(&format!("{} {} {}", result.target, symbols::ARROW, artifact.display()))
        }
        BuildOutcome::Failed { error } => print_error(&format!("{}: {}", result.target, error)),
      }
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    println!();
    println!("Build {}", if success { "complete" } else { "failed" });
    print_stat("Targets", &results.len().to_string());
    print_stat("Succeeded", &succeeded.to_string());
    print_stat("Failed", &(results.len() - succeeded).to_string());
    print_stat("Time", &format_duration(elapsed));
  }

  Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
