//! External tool execution.
//!
//! Translators, compilers and include providers are all external programs. This
//! module runs them with captured output and turns anything other than a clean
//! exit into a [`Diagnostic`].

use std::fmt;
use std::process::Stdio;

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Human-readable failure report captured from an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{tool} failed{}: {message}", .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
pub struct Diagnostic {
  /// Program (or collaborator) that produced the diagnostic.
  pub tool: String,
  /// Exit code, when the tool ran and exited normally.
  pub code: Option<i32>,
  /// Captured diagnostic text, unmodified.
  pub message: String,
}

impl Diagnostic {
  pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      tool: tool.into(),
      code: None,
      message: message.into(),
    }
  }

  pub fn with_code(mut self, code: Option<i32>) -> Self {
    self.code = code;
    self
  }
}

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", quote(&self.program))?;
    for arg in &self.args {
      write!(f, " {}", quote(arg))?;
    }
    Ok(())
  }
}

fn quote(word: &str) -> String {
  if !word.is_empty() && !word.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
    return word.to_string();
  }
  format!("'{}'", word.replace('\'', r"'\''"))
}

/// Run an external tool to completion.
///
/// The child inherits the caller's environment (compilers need `PATH` and
/// friends) but runs with `LC_ALL=C`/`LANG=C` so diagnostics are not localized.
/// Stdin is closed.
///
/// # Returns
///
/// Captured stdout on a zero exit status; stderr is only logged. A spawn failure or non-zero
/// exit becomes a [`Diagnostic`] whose message is the tool's stderr, or its
/// stdout when stderr is empty.
pub async fn run_tool(invocation: &Invocation) -> Result<String, Diagnostic> {
  info!(program = %invocation.program, "running tool");
  debug!(command = %invocation, "spawning process");

  let mut command = Command::new(&invocation.program);
  command
    .args(&invocation.args)
    .stdin(Stdio::null())
    .env("LANG", "C")
    .env("LC_ALL", "C");

  let output = command
    .output()
    .await
    .map_err(|e| Diagnostic::new(&invocation.program, format!("failed to run {}: {}", invocation.program, e)))?;

  let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
  let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

  if !output.status.success() {
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "tool stdout");
    }
    let message = if stderr.is_empty() { stdout } else { stderr };
    return Err(Diagnostic::new(&invocation.program, message).with_code(output.status.code()));
  }

  if !stderr.is_empty() {
    debug!(stderr = %stderr, "tool stderr");
  }

  Ok(stdout)
}
