//! Build-output layout.
//!
//! ```text
//! <root>/temp/<target>/          translated sources and the staged artifact
//! <root>/lib/<target><suffix>    finished artifacts
//! ```
//!
//! Every target owns its own temp directory, so callers building disjoint target
//! sets into the same root do not step on each other.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::consts::{LIB_DIR_NAME, TEMP_DIR_NAME};

/// File suffix for loadable extension modules on this platform.
#[cfg(windows)]
pub fn default_artifact_suffix() -> &'static str {
  ".pyd"
}

/// File suffix for loadable extension modules on this platform.
#[cfg(not(windows))]
pub fn default_artifact_suffix() -> &'static str {
  ".so"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
  root: PathBuf,
  suffix: String,
}

impl BuildLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      suffix: default_artifact_suffix().to_string(),
    }
  }

  pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
    self.suffix = suffix.into();
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn suffix(&self) -> &str {
    &self.suffix
  }

  pub fn temp_dir(&self, target: &str) -> PathBuf {
    self.root.join(TEMP_DIR_NAME).join(target)
  }

  pub fn lib_dir(&self) -> PathBuf {
    self.root.join(LIB_DIR_NAME)
  }

  pub fn artifact_file_name(&self, target: &str) -> String {
    format!("{}{}", target, self.suffix)
  }

  /// Where the compiler writes before the artifact is published.
  pub fn staged_artifact_path(&self, target: &str) -> PathBuf {
    self.temp_dir(target).join(self.artifact_file_name(target))
  }

  /// Where a successful build's artifact ends up.
  pub fn artifact_path(&self, target: &str) -> PathBuf {
    self.lib_dir().join(self.artifact_file_name(target))
  }

  /// Create the directories `target` needs and return its temp directory.
  pub async fn prepare(&self, target: &str) -> io::Result<PathBuf> {
    let temp_dir = self.temp_dir(target);
    fs::create_dir_all(&temp_dir).await?;
    fs::create_dir_all(self.lib_dir()).await?;
    Ok(temp_dir)
  }

  /// Remove the whole build-output area.
  ///
  /// Returns `false` if there was nothing to remove.
  pub async fn clean(&self) -> io::Result<bool> {
    match fs::remove_dir_all(&self.root).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }
}
