use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::macros::{MacroMap, MacroValue};

/// Translation-compatibility mode handed to the translator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LanguageLevel {
  Two,
  #[default]
  Three,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported language level {0} (expected 2 or 3)")]
pub struct InvalidLanguageLevel(pub String);

impl LanguageLevel {
  /// Command-line flag understood by Cython-style translators.
  pub fn translator_flag(self) -> &'static str {
    match self {
      LanguageLevel::Two => "-2",
      LanguageLevel::Three => "-3",
    }
  }
}

impl TryFrom<u8> for LanguageLevel {
  type Error = InvalidLanguageLevel;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      2 => Ok(LanguageLevel::Two),
      3 => Ok(LanguageLevel::Three),
      other => Err(InvalidLanguageLevel(other.to_string())),
    }
  }
}

impl From<LanguageLevel> for u8 {
  fn from(level: LanguageLevel) -> Self {
    match level {
      LanguageLevel::Two => 2,
      LanguageLevel::Three => 3,
    }
  }
}

impl FromStr for LanguageLevel {
  type Err = InvalidLanguageLevel;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "2" => Ok(LanguageLevel::Two),
      "3" => Ok(LanguageLevel::Three),
      other => Err(InvalidLanguageLevel(other.to_string())),
    }
  }
}

impl fmt::Display for LanguageLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", u8::from(*self))
  }
}

/// One buildable source-to-artifact unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
  name: String,
  sources: Vec<PathBuf>,
  extra_compile_args: Vec<String>,
  extra_link_args: Vec<String>,
  macros: MacroMap,
}

impl BuildTarget {
  pub fn new<I, P>(name: impl Into<String>, sources: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    Self {
      name: name.into(),
      sources: sources.into_iter().map(Into::into).collect(),
      extra_compile_args: Vec::new(),
      extra_link_args: Vec::new(),
      macros: MacroMap::new(),
    }
  }

  pub fn with_compile_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.extra_compile_args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn with_link_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.extra_link_args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn with_macros(mut self, macros: MacroMap) -> Self {
    self.macros = macros;
    self
  }

  pub fn with_macro(mut self, name: impl Into<String>, value: impl Into<MacroValue>) -> Self {
    self.macros.define(name, value);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn sources(&self) -> &[PathBuf] {
    &self.sources
  }

  pub fn extra_compile_args(&self) -> &[String] {
    &self.extra_compile_args
  }

  pub fn extra_link_args(&self) -> &[String] {
    &self.extra_link_args
  }

  pub fn macros(&self) -> &MacroMap {
    &self.macros
  }
}

/// Whether `name` can be used as a target name.
///
/// Names become directory and file names in the build-output area, so they must
/// be non-empty and free of path separators.
pub fn is_valid_target_name(name: &str) -> bool {
  !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\']) && !Path::new(name).is_absolute()
}
