mod build;
mod clean;
mod plan;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use plan::cmd_plan;

use std::path::Path;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use extbuild_lib::BuildConfig;

fn load_config(path: &Path) -> Result<BuildConfig> {
  BuildConfig::load(path).with_context(|| format!("Failed to load build file: {}", path.display()))
}

/// Builds run one subprocess at a time, so a single-threaded runtime is enough.
fn runtime() -> Result<Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
