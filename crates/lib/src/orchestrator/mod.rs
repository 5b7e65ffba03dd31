//! Extension build orchestration.
//!
//! The [`Orchestrator`] takes a list of [`BuildTarget`]s through
//! translate → compile/link, one target at a time, and reports a
//! [`BuildResult`] per target. Tools are injected: a [`Translator`], a
//! [`CompilerLinker`] and any number of [`IncludeProvider`]s.
//!
//! Failures are recorded per target and never retried. A failing target does
//! not stop later targets from building.

mod layout;
mod plan;
mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::compile::{CompileRequest, CompilerLinker};
use crate::exec::Diagnostic;
use crate::provider::{IncludeProvider, query_all};
use crate::target::{BuildTarget, LanguageLevel, is_valid_target_name};
use crate::translate::{TranslateRequest, TranslatedSource, Translator};

pub use layout::{BuildLayout, default_artifact_suffix};
pub use plan::{PlanError, TargetPlan};
pub use types::{BuildError, BuildOutcome, BuildResult, TargetError, TargetState, all_succeeded};
use types::StateLog;

pub struct Orchestrator<T, C> {
  translator: T,
  compiler: C,
  providers: Vec<Box<dyn IncludeProvider>>,
  layout: BuildLayout,
}

impl<T: Translator, C: CompilerLinker> Orchestrator<T, C> {
  pub fn new(translator: T, compiler: C, layout: BuildLayout) -> Self {
    Self {
      translator,
      compiler,
      providers: Vec::new(),
      layout,
    }
  }

  /// Register an include provider. Providers are queried in registration order.
  pub fn with_provider(self, provider: impl IncludeProvider + 'static) -> Self {
    self.with_boxed_provider(Box::new(provider))
  }

  pub fn with_boxed_provider(mut self, provider: Box<dyn IncludeProvider>) -> Self {
    self.providers.push(provider);
    self
  }

  pub fn translator(&self) -> &T {
    &self.translator
  }

  pub fn compiler(&self) -> &C {
    &self.compiler
  }

  pub fn providers(&self) -> &[Box<dyn IncludeProvider>] {
    &self.providers
  }

  pub fn layout(&self) -> &BuildLayout {
    &self.layout
  }

  /// Build every target, in order.
  ///
  /// Target names are checked before anything runs: an invalid or duplicate
  /// name rejects the whole call. Otherwise one [`BuildResult`] is returned per
  /// target, in input order.
  pub async fn build(
    &self,
    targets: &[BuildTarget],
    language_level: LanguageLevel,
  ) -> Result<Vec<BuildResult>, BuildError> {
    validate_names(targets)?;

    info!(
      target_count = targets.len(),
      language_level = %language_level,
      build_dir = ?self.layout.root(),
      "starting build"
    );

    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
      results.push(self.build_target(target, language_level).await);
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(succeeded, failed = results.len() - succeeded, "build complete");

    Ok(results)
  }

  async fn build_target(&self, target: &BuildTarget, language_level: LanguageLevel) -> BuildResult {
    let name = target.name();
    let mut states = StateLog::new();

    states.advance(TargetState::Translating);
    info!(target_name = %name, "translating target");
    let (include_dirs, translated) = match self.translate(target, language_level).await {
      Ok(found) => found,
      Err(error) => return fail(name, states, error),
    };

    states.advance(TargetState::Compiling);
    info!(target_name = %name, sources = translated.files.len(), "compiling target");
    match self.compile(target, &include_dirs, &translated).await {
      Ok(artifact) => {
        states.advance(TargetState::Succeeded);
        info!(target_name = %name, artifact = ?artifact, "target built");
        BuildResult {
          target: name.to_string(),
          states: states.into_states(),
          outcome: BuildOutcome::Succeeded { artifact },
        }
      }
      Err(error) => fail(name, states, error),
    }
  }

  async fn translate(
    &self,
    target: &BuildTarget,
    language_level: LanguageLevel,
  ) -> Result<(Vec<PathBuf>, TranslatedSource), TargetError> {
    for source in target.sources() {
      if !fs::try_exists(source).await.unwrap_or(false) {
        return Err(TargetError::MissingSource { path: source.clone() });
      }
    }

    let include_dirs = query_all(&self.providers)
      .await
      .map_err(|e| TargetError::IncludeProvider {
        provider: e.provider,
        diagnostic: e.diagnostic,
      })?;
    debug!(target_name = %target.name(), include_dirs = ?include_dirs, "resolved include dirs");

    let work_dir = self
      .layout
      .prepare(target.name())
      .await
      .map_err(|e| TargetError::io(self.layout.root(), e))?;

    let request = TranslateRequest {
      target: target.name(),
      sources: target.sources(),
      language_level,
      macros: target.macros(),
      include_dirs: &include_dirs,
      work_dir: &work_dir,
    };
    let translated = self
      .translator
      .translate(&request)
      .await
      .map_err(|diagnostic| TargetError::TranslationFailure { diagnostic })?;

    Ok((include_dirs, translated))
  }

  async fn compile(
    &self,
    target: &BuildTarget,
    include_dirs: &[PathBuf],
    translated: &TranslatedSource,
  ) -> Result<PathBuf, TargetError> {
    let staged = self.layout.staged_artifact_path(target.name());
    remove_stale(&staged).await?;

    let request = CompileRequest {
      target: target.name(),
      sources: &translated.files,
      compile_args: target.extra_compile_args(),
      link_args: target.extra_link_args(),
      include_dirs,
      macros: target.macros(),
      output: &staged,
    };
    let produced = self
      .compiler
      .compile(&request)
      .await
      .map_err(|diagnostic| TargetError::CompileLinkFailure { diagnostic })?;

    if !fs::try_exists(&produced).await.unwrap_or(false) {
      return Err(TargetError::CompileLinkFailure {
        diagnostic: Diagnostic::new(
          "compiler/linker",
          format!("reported success but produced no artifact at {}", produced.display()),
        ),
      });
    }

    let artifact = self.layout.artifact_path(target.name());
    publish(&produced, &artifact).await?;
    Ok(artifact)
  }
}

fn validate_names(targets: &[BuildTarget]) -> Result<(), BuildError> {
  // Names become paths, so `calc` and `Calc` collide on case-insensitive filesystems.
  let mut seen = HashSet::with_capacity(targets.len());
  for target in targets {
    if !is_valid_target_name(target.name()) {
      return Err(BuildError::InvalidTargetName(target.name().to_string()));
    }
    if !seen.insert(target.name().to_ascii_lowercase()) {
      return Err(BuildError::DuplicateTargetName(target.name().to_string()));
    }
  }
  Ok(())
}

fn fail(name: &str, mut states: StateLog, error: TargetError) -> BuildResult {
  states.advance(TargetState::Failed);
  warn!(target_name = %name, error = %error, "target failed");
  BuildResult {
    target: name.to_string(),
    states: states.into_states(),
    outcome: BuildOutcome::Failed { error },
  }
}

/// Drop a staged artifact left behind by an earlier run, so a compiler that
/// exits cleanly without writing cannot be mistaken for a success.
async fn remove_stale(staged: &Path) -> Result<(), TargetError> {
  match fs::remove_file(staged).await {
    Ok(()) => {
      debug!(path = ?staged, "removed stale staged artifact");
      Ok(())
    }
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(TargetError::io(staged, e)),
  }
}

/// Move the staged artifact into the library directory.
async fn publish(produced: &Path, artifact: &Path) -> Result<(), TargetError> {
  if fs::rename(produced, artifact).await.is_ok() {
    return Ok(());
  }

  // Compilers may write outside the build root (another filesystem).
  warn!(from = ?produced, to = ?artifact, "rename failed, copying artifact");
  fs::copy(produced, artifact)
    .await
    .map_err(|e| TargetError::io(artifact, e))?;
  if let Err(e) = fs::remove_file(produced).await {
    warn!(path = ?produced, error = %e, "failed to remove staged artifact");
  }
  Ok(())
}
