//! Implementation of the `extbuild clean` command.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{load_config, runtime};
use crate::output::{OutputFormat, print_info, print_json, print_success};

#[derive(Serialize)]
struct CleanReport<'a> {
  build_dir: &'a Path,
  removed: bool,
}

pub fn cmd_clean(config_path: &Path, format: OutputFormat) -> Result<ExitCode> {
  let config = load_config(config_path)?;
  let layout = config.layout();

  let rt = runtime()?;
  let removed = rt
    .block_on(layout.clean())
    .with_context(|| format!("Failed to remove build directory: {}", layout.root().display()))?;

  if format.is_json() {
    print_json(&CleanReport {
      build_dir: layout.root(),
      removed,
    })?;
  } else if removed {
    print_success(&format!("Removed {}", layout.root().display()));
  } else {
    print_info(&format!("Nothing to clean at {}", layout.root().display()));
  }

  Ok(ExitCode::SUCCESS)
}
