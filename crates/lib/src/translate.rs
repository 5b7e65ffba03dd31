//! Source translation.
//!
//! The translator lowers annotated high-level sources (`.pyx`, `.py`) into C or
//! C++ that the compiler can consume. [`CommandTranslator`] drives a
//! Cython-compatible command line; tests substitute their own [`Translator`].

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::consts::{ANNOTATED_EXTENSIONS, DEFAULT_TRANSLATOR};
use crate::exec::{Diagnostic, Invocation, run_tool};
use crate::target::{LanguageLevel, MacroMap};

/// Everything a translator gets to see for one target.
#[derive(Debug, Clone, Copy)]
pub struct TranslateRequest<'a> {
  pub target: &'a str,
  pub sources: &'a [PathBuf],
  pub language_level: LanguageLevel,
  pub macros: &'a MacroMap,
  pub include_dirs: &'a [PathBuf],
  /// Per-target directory for lowered sources.
  pub work_dir: &'a Path,
}

/// Compiler-ready sources produced by a translator, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslatedSource {
  pub files: Vec<PathBuf>,
}

/// Lowers a target's sources into compiler-ready form.
pub trait Translator {
  fn translate(&self, request: &TranslateRequest<'_>) -> impl Future<Output = Result<TranslatedSource, Diagnostic>>;
}

/// Whether `path` needs translating before it can be compiled.
pub fn is_annotated(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ANNOTATED_EXTENSIONS.contains(&ext))
    .unwrap_or(false)
}

/// Translator backed by a Cython-compatible executable.
///
/// Each annotated source becomes one invocation:
///
/// ```text
/// <program> [args..] -3 [--cplus] --include-dir=<dir>.. --output-file=<work_dir>/<stem>.c <source>
/// ```
///
/// C and C++ sources pass through untouched. Macros only matter to the C
/// compiler, so they are not put on the translator's command line.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
  program: String,
  args: Vec<String>,
  cplus: bool,
}

impl Default for CommandTranslator {
  fn default() -> Self {
    Self::new(DEFAULT_TRANSLATOR)
  }
}

impl CommandTranslator {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cplus: false,
    }
  }

  /// Arguments placed before the generated ones.
  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }

  /// Emit C++ instead of C.
  pub fn with_cplus(mut self, cplus: bool) -> Self {
    self.cplus = cplus;
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  fn output_path(&self, source: &Path, work_dir: &Path) -> PathBuf {
    let stem = source.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let ext = if self.cplus { "cpp" } else { "c" };
    work_dir.join(format!("{}.{}", stem, ext))
  }

  /// The command line used to lower `source`.
  pub fn invocation(&self, source: &Path, request: &TranslateRequest<'_>) -> Invocation {
    let mut invocation = Invocation::new(&self.program)
      .args(self.args.iter().cloned())
      .arg(request.language_level.translator_flag());
    if self.cplus {
      invocation = invocation.arg("--cplus");
    }
    for dir in request.include_dirs {
      invocation = invocation.arg(format!("--include-dir={}", dir.display()));
    }
    invocation
      .arg(format!("--output-file={}", self.output_path(source, request.work_dir).display()))
      .arg(source.to_string_lossy())
  }

  /// The compiler-ready files [`Translator::translate`] would hand back.
  pub fn lowered_sources(&self, request: &TranslateRequest<'_>) -> Vec<PathBuf> {
    request
      .sources
      .iter()
      .map(|source| {
        if is_annotated(source) {
          self.output_path(source, request.work_dir)
        } else {
          source.clone()
        }
      })
      .collect()
  }

  /// Every command line [`Translator::translate`] would run for `request`.
  pub fn planned_invocations(&self, request: &TranslateRequest<'_>) -> Vec<Invocation> {
    request
      .sources
      .iter()
      .filter(|source| is_annotated(source))
      .map(|source| self.invocation(source, request))
      .collect()
  }
}

impl Translator for CommandTranslator {
  async fn translate(&self, request: &TranslateRequest<'_>) -> Result<TranslatedSource, Diagnostic> {
    // Resolve every output up front so a collision fails before anything runs.
    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(request.sources.len());
    for source in request.sources {
      if !is_annotated(source) {
        plan.push((source, None));
        continue;
      }
      let output = self.output_path(source, request.work_dir);
      if !seen.insert(output.clone()) {
        return Err(Diagnostic::new(
          &self.program,
          format!(
            "{} would overwrite {}, which another source of '{}' also lowers to",
            source.display(),
            output.display(),
            request.target
          ),
        ));
      }
      plan.push((source, Some(output)));
    }

    let mut files = Vec::with_capacity(plan.len());
    for (source, output) in plan {
      let Some(output) = output else {
        debug!(source = ?source, "passing source through untranslated");
        files.push(source.clone());
        continue;
      };

      remove_previous_output(&self.program, &output).await?;

      info!(target_name = %request.target, source = ?source, "translating");
      run_tool(&self.invocation(source, request)).await?;

      if !fs::try_exists(&output).await.unwrap_or(false) {
        return Err(Diagnostic::new(
          &self.program,
          format!("translator exited successfully but wrote no {}", output.display()),
        ));
      }
      files.push(output);
    }

    Ok(TranslatedSource { files })
  }
}

/// Output left by an earlier run must not stand in for this run's output.
async fn remove_previous_output(program: &str, output: &Path) -> Result<(), Diagnostic> {
  match fs::remove_file(output).await {
    Ok(()) => {
      debug!(path = ?output, "removed previous translator output");
      Ok(())
    }
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(Diagnostic::new(
      program,
      format!("cannot remove previous output {}: {}", output.display(), e),
    )),
  }
}
