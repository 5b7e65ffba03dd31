//! Implementation of the `extbuild plan` command.
//!
//! Resolves include directories and prints the command lines a build would
//! run. Neither the translator nor the compiler is invoked.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use super::{load_config, runtime};
use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_plan(config_path: &Path, format: OutputFormat) -> Result<ExitCode> {
  let config = load_config(config_path)?;
  let orchestrator = config.orchestrator();

  let rt = runtime()?;
  let plans = rt
    .block_on(orchestrator.plan(&config.targets, config.language_level))
    .context("Failed to plan build")?;

  if format.is_json() {
    print_json(&plans)?;
    return Ok(ExitCode::SUCCESS);
  }

  println!("Plan: {} target(s)", plans.len());
  print_stat("Language level", &config.language_level.to_string());
  print_stat("Build dir", &config.build_dir.display().to_string());

  for plan in &plans {
    println!();
    print_info(&format!("{} {} {}", plan.target, symbols::ARROW, plan.artifact.display()));
    for dir in &plan.include_dirs {
      print_stat("include", &dir.display().to_string());
    }
    for invocation in &plan.translate {
      print_stat("translate", &invocation.to_string());
    }
    print_stat("compile", &plan.compile.to_string());
  }

  Ok(ExitCode::SUCCESS)
}
