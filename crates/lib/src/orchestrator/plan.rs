//! Dry runs for command-backed builds.
//!
//! Planning resolves include directories and renders the exact command lines a
//! build would run, without invoking the translator or compiler and without
//! touching the build directory.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::{Orchestrator, validate_names};
use crate::compile::{CommandCompiler, CompileRequest};
use crate::exec::Invocation;
use crate::provider::{ProviderError, query_all};
use crate::target::{BuildTarget, LanguageLevel};
use crate::translate::{CommandTranslator, TranslateRequest};

/// What a build would do for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPlan {
  pub target: String,
  pub sources: Vec<PathBuf>,
  pub include_dirs: Vec<PathBuf>,
  /// One command per annotated source.
  pub translate: Vec<Invocation>,
  pub compile: Invocation,
  pub artifact: PathBuf,
}

#[derive(Debug, Error)]
pub enum PlanError {
  #[error(transparent)]
  Build(#[from] super::BuildError),

  #[error(transparent)]
  Provider(#[from] ProviderError),
}

impl Orchestrator<CommandTranslator, CommandCompiler> {
  /// Plan every target. Providers are queried once and shared by all targets.
  pub async fn plan(&self, targets: &[BuildTarget], language_level: LanguageLevel) -> Result<Vec<TargetPlan>, PlanError> {
    validate_names(targets)?;
    let include_dirs = query_all(&self.providers).await?;
    info!(target_count = targets.len(), include_dirs = include_dirs.len(), "planned build");

    Ok(
      targets
        .iter()
        .map(|target| self.plan_target(target, &include_dirs, language_level))
        .collect(),
    )
  }

  fn plan_target(&self, target: &BuildTarget, include_dirs: &[PathBuf], language_level: LanguageLevel) -> TargetPlan {
    let work_dir = self.layout.temp_dir(target.name());
    let translate_request = TranslateRequest {
      target: target.name(),
      sources: target.sources(),
      language_level,
      macros: target.macros(),
      include_dirs,
      work_dir: &work_dir,
    };
    let lowered = self.translator.lowered_sources(&translate_request);
    let staged = self.layout.staged_artifact_path(target.name());
    let compile_request = CompileRequest {
      target: target.name(),
      sources: &lowered,
      compile_args: target.extra_compile_args(),
      link_args: target.extra_link_args(),
      include_dirs,
      macros: target.macros(),
      output: &staged,
    };

    TargetPlan {
      target: target.name().to_string(),
      sources: target.sources().to_vec(),
      include_dirs: include_dirs.to_vec(),
      translate: self.translator.planned_invocations(&translate_request),
      compile: self.compiler.invocation(&compile_request),
      artifact: self.layout.artifact_path(target.name()),
    }
  }
}
