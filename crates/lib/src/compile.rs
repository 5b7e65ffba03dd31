//! Compiling and linking.
//!
//! The [`CompilerLinker`] turns translated sources into one loadable module.
//! [`CommandCompiler`] drives a Unix-style C compiler driver (`cc`, `gcc`,
//! `clang`) in a single compile-and-link invocation.

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::consts::{COMPILER_ENV_VAR, DEFAULT_COMPILER};
use crate::exec::{Diagnostic, Invocation, run_tool};
use crate::target::MacroMap;

/// Everything the compiler/linker gets for one target.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
  pub target: &'a str,
  pub sources: &'a [PathBuf],
  pub compile_args: &'a [String],
  pub link_args: &'a [String],
  pub include_dirs: &'a [PathBuf],
  pub macros: &'a MacroMap,
  /// Where the artifact must be written.
  pub output: &'a Path,
}

/// Produces a loadable binary module from compiler-ready sources.
pub trait CompilerLinker {
  /// Returns the path of the produced artifact.
  fn compile(&self, request: &CompileRequest<'_>) -> impl Future<Output = Result<PathBuf, Diagnostic>>;
}

/// Base flags for building a loadable shared module.
pub fn default_base_args() -> Vec<String> {
  vec!["-shared".to_string(), "-fPIC".to_string()]
}

/// Compiler/linker backed by a C compiler driver.
///
/// ```text
/// <program> <base args> <compile args> -I<dir>.. -D<macro>.. <sources> -o <output> <link args>
/// ```
///
/// Link args go last so libraries resolve against the objects before them.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
  program: String,
  base_args: Vec<String>,
}

impl Default for CommandCompiler {
  fn default() -> Self {
    Self::new(DEFAULT_COMPILER)
  }
}

impl CommandCompiler {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      base_args: default_base_args(),
    }
  }

  /// Compiler named by `$CC`, falling back to `cc`.
  pub fn from_env() -> Self {
    match std::env::var(COMPILER_ENV_VAR) {
      Ok(cc) if !cc.trim().is_empty() => Self::new(cc.trim()),
      _ => Self::default(),
    }
  }

  /// Replace the base flags (`-shared -fPIC` by default).
  pub fn with_base_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.base_args = args.into_iter().map(Into::into).collect();
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn invocation(&self, request: &CompileRequest<'_>) -> Invocation {
    let includes = request.include_dirs.iter().map(|dir| format!("-I{}", dir.display()));
    let sources = request.sources.iter().map(|src| src.to_string_lossy().into_owned());

    Invocation::new(&self.program)
      .args(self.base_args.iter().cloned())
      .args(request.compile_args.iter().cloned())
      .args(includes)
      .args(request.macros.to_define_flags())
      .args(sources)
      .arg("-o")
      .arg(request.output.to_string_lossy())
      .args(request.link_args.iter().cloned())
  }
}

impl CompilerLinker for CommandCompiler {
  async fn compile(&self, request: &CompileRequest<'_>) -> Result<PathBuf, Diagnostic> {
    info!(target_name = %request.target, program = %self.program, "compiling");
    run_tool(&self.invocation(request)).await?;
    Ok(request.output.to_path_buf())
  }
}
