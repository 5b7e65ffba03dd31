//! Include-path providers.
//!
//! An [`IncludeProvider`] is a named external capability that contributes
//! compiler search directories, e.g. a numeric-array library reporting where its
//! headers live. Providers are queried once per target, in registration order.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use thiserror::Error;
use tracing::debug;

use crate::exec::{Diagnostic, Invocation, run_tool};

/// Boxed future returned by [`IncludeProvider::include_dirs`].
pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<PathBuf>, Diagnostic>> + 'a>>;

/// A named source of include directories.
///
/// The orchestrator holds providers as trait objects, so the query returns a
/// boxed future rather than being an `async fn`.
pub trait IncludeProvider {
  fn name(&self) -> &str;

  fn include_dirs(&self) -> ProviderFuture<'_>;
}

/// A provider that failed to answer.
#[derive(Debug, Clone, Error)]
#[error("include provider '{provider}' failed: {diagnostic}")]
pub struct ProviderError {
  pub provider: String,
  pub diagnostic: Diagnostic,
}

/// Query every provider in order and concatenate the results.
///
/// Duplicates are kept; the first failing provider aborts the query.
pub async fn query_all(providers: &[Box<dyn IncludeProvider>]) -> Result<Vec<PathBuf>, ProviderError> {
  let mut dirs = Vec::new();
  for provider in providers {
    let found = provider.include_dirs().await.map_err(|diagnostic| ProviderError {
      provider: provider.name().to_string(),
      diagnostic,
    })?;
    debug!(provider = %provider.name(), dirs = ?found, "include provider answered");
    dirs.extend(found);
  }
  Ok(dirs)
}

/// Provider with a fixed directory list.
#[derive(Debug, Clone)]
pub struct StaticIncludeProvider {
  name: String,
  dirs: Vec<PathBuf>,
}

impl StaticIncludeProvider {
  pub fn new<I, P>(name: impl Into<String>, dirs: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    Self {
      name: name.into(),
      dirs: dirs.into_iter().map(Into::into).collect(),
    }
  }
}

impl IncludeProvider for StaticIncludeProvider {
  fn name(&self) -> &str {
    &self.name
  }

  fn include_dirs(&self) -> ProviderFuture<'_> {
    Box::pin(async move { Ok(self.dirs.clone()) })
  }
}

/// Provider that asks an external program.
///
/// Each non-empty line of the program's stdout, trimmed, is one directory. This
/// is how the numeric-array library is asked for its headers:
/// `python3 -c "import numpy; print(numpy.get_include())"`.
#[derive(Debug, Clone)]
pub struct CommandIncludeProvider {
  name: String,
  invocation: Invocation,
}

impl CommandIncludeProvider {
  pub fn new(name: impl Into<String>, invocation: Invocation) -> Self {
    Self {
      name: name.into(),
      invocation,
    }
  }
}

impl IncludeProvider for CommandIncludeProvider {
  fn name(&self) -> &str {
    &self.name
  }

  fn include_dirs(&self) -> ProviderFuture<'_> {
    Box::pin(async move {
      let stdout = run_tool(&self.invocation).await?;
      Ok(parse_dir_lines(&stdout))
    })
  }
}

fn parse_dir_lines(stdout: &str) -> Vec<PathBuf> {
  stdout
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(PathBuf::from)
    .collect()
}
