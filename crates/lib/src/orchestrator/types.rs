//! Types for build orchestration.
//!
//! This module defines the per-target state machine, per-target errors, the
//! result reported for each target, and call-level errors.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::exec::Diagnostic;

/// Where a target is in its build.
///
/// `Pending → Translating → Compiling → {Succeeded, Failed}`. `Failed` is only
/// reachable from `Translating` or `Compiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
  Pending,
  Translating,
  Compiling,
  Succeeded,
  Failed,
}

impl TargetState {
  pub fn can_transition_to(self, next: TargetState) -> bool {
    use TargetState::*;
    matches!(
      (self, next),
      (Pending, Translating) | (Translating, Compiling) | (Translating, Failed) | (Compiling, Succeeded) | (Compiling, Failed)
    )
  }
}

/// Why a single target failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetError {
  /// A listed source path does not exist.
  #[error("source not found: {}", .path.display())]
  MissingSource { path: PathBuf },

  /// An include provider could not report its directories.
  #[error("include provider '{provider}' failed: {diagnostic}")]
  IncludeProvider { provider: String, diagnostic: Diagnostic },

  /// The translator rejected the sources.
  #[error("translation failed: {diagnostic}")]
  TranslationFailure { diagnostic: Diagnostic },

  /// The compiler/linker failed or produced nothing.
  #[error("compile/link failed: {diagnostic}")]
  CompileLinkFailure { diagnostic: Diagnostic },

  /// The build-output area could not be written.
  #[error("build output error at {}: {message}", .path.display())]
  Io { path: PathBuf, message: String },
}

impl TargetError {
  /// Diagnostic captured from an external tool, if one was involved.
  pub fn diagnostic(&self) -> Option<&Diagnostic> {
    match self {
      TargetError::IncludeProvider { diagnostic, .. }
      | TargetError::TranslationFailure { diagnostic }
      | TargetError::CompileLinkFailure { diagnostic } => Some(diagnostic),
      TargetError::MissingSource { .. } | TargetError::Io { .. } => None,
    }
  }

  pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
    TargetError::Io {
      path: path.to_path_buf(),
      message: err.to_string(),
    }
  }
}

/// Final outcome of one target. Exactly one of artifact or error exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
  Succeeded { artifact: PathBuf },
  Failed { error: TargetError },
}

/// Result of building one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
  pub target: String,
  /// Every state the target passed through, starting at `Pending`.
  pub states: Vec<TargetState>,
  #[serde(flatten)]
  pub outcome: BuildOutcome,
}

impl BuildResult {
  pub fn is_success(&self) -> bool {
    matches!(self.outcome, BuildOutcome::Succeeded { .. })
  }

  pub fn artifact(&self) -> Option<&Path> {
    match &self.outcome {
      BuildOutcome::Succeeded { artifact } => Some(artifact),
      BuildOutcome::Failed { .. } => None,
    }
  }

  pub fn error(&self) -> Option<&TargetError> {
    match &self.outcome {
      BuildOutcome::Succeeded { .. } => None,
      BuildOutcome::Failed { error } => Some(error),
    }
  }

  pub fn final_state(&self) -> TargetState {
    self.states.last().copied().unwrap_or(TargetState::Pending)
  }
}

/// Returns true if every target succeeded.
pub fn all_succeeded(results: &[BuildResult]) -> bool {
  results.iter().all(BuildResult::is_success)
}

/// Errors that reject a whole `build` call before any tool runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// Two targets in one call share a name.
  #[error("duplicate target name: {0}")]
  DuplicateTargetName(String),

  /// A name that cannot be used for build-output files.
  #[error("invalid target name: {0:?}")]
  InvalidTargetName(String),
}

/// Records a target's state transitions.
#[derive(Debug, Clone)]
pub(crate) struct StateLog {
  states: Vec<TargetState>,
}

impl StateLog {
  pub(crate) fn new() -> Self {
    Self {
      states: vec![TargetState::Pending],
    }
  }

  pub(crate) fn current(&self) -> TargetState {
    self.states.last().copied().unwrap_or(TargetState::Pending)
  }

  pub(crate) fn advance(&mut self, next: TargetState) {
    debug_assert!(
      self.current().can_transition_to(next),
      "illegal transition {:?} -> {:?}",
      self.current(),
      next
    );
    self.states.push(next);
  }

  pub(crate) fn into_states(self) -> Vec<TargetState> {
    self.states
  }
}
