//! Shared utilities.
//!
//! Path helpers used across the crate, plus test helpers.

use std::path::{Path, PathBuf};

#[cfg(test)]
pub mod testutil;

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}
