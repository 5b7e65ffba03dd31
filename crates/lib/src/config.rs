//! Build file loading.
//!
//! A build file (`extbuild.toml`) declares targets, include providers and the
//! toolchain. Relative paths in it resolve against the file's own directory.
//!
//! ```toml
//! language_level = 3
//!
//! [[include_provider]]
//! name = "numpy"
//! command = ["python3", "-c", "import numpy; print(numpy.get_include())"]
//!
//! [[target]]
//! name = "cythonfn"
//! sources = ["cythonfn.pyx"]
//! extra_compile_args = ["-fopenmp"]
//! extra_link_args = ["-fopenmp"]
//! define_macros = { NPY_NO_DEPRECATED_API = "NPY_1_7_API_VERSION" }
//! ```
//!
//! `define_macros` may also be a list of `[name, value]` or `[name]` pairs.
//! In the mapping form, `true` defines a macro without a value. A top-level
//! `define_macros` applies to every target; a target's own entries win.
//! A target without `name` is named after its first source's file stem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::compile::CommandCompiler;
use crate::consts::DEFAULT_BUILD_DIR;
use crate::exec::Invocation;
use crate::orchestrator::{BuildLayout, Orchestrator, default_artifact_suffix};
use crate::provider::{CommandIncludeProvider, IncludeProvider, StaticIncludeProvider};
use crate::target::{BuildTarget, LanguageLevel, MacroMap, MacroValue};
use crate::translate::CommandTranslator;
use crate::util::resolve_relative;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", .path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse {}: {source}", .path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("{scope}: invalid macro definition: {message}")]
  InvalidMacro { scope: String, message: String },

  #[error("target '{0}' has no sources")]
  NoSources(String),

  #[error("cannot derive a target name from {}; set `name`", .0.display())]
  UnnamedTarget(PathBuf),

  #[error("include provider '{name}': {message}")]
  InvalidProvider { name: String, message: String },

  #[error("{section} program must not be empty")]
  EmptyProgram { section: &'static str },
}

/// `[translator]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslatorConfig {
  pub program: Option<String>,
  #[serde(default)]
  pub args: Vec<String>,
  #[serde(default)]
  pub cplus: bool,
}

/// `[compiler]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
  /// Falls back to `$CC`, then `cc`.
  pub program: Option<String>,
  /// Replaces the default `-shared -fPIC`.
  pub args: Option<Vec<String>>,
}

/// One `[[include_provider]]` entry: exactly one of `command` or `dirs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
  pub name: String,
  pub command: Option<Vec<String>>,
  pub dirs: Option<Vec<PathBuf>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
  language_level: Option<LanguageLevel>,
  build_dir: Option<PathBuf>,
  artifact_suffix: Option<String>,
  /// Defined for every target, under each target's own macros.
  define_macros: Option<RawMacros>,
  #[serde(default)]
  translator: TranslatorConfig,
  #[serde(default)]
  compiler: CompilerConfig,
  #[serde(default, rename = "include_provider")]
  include_providers: Vec<ProviderConfig>,
  #[serde(default, rename = "target")]
  targets: Vec<RawTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
  /// Defaults to the first source's file stem.
  name: Option<String>,
  sources: Vec<PathBuf>,
  #[serde(default)]
  extra_compile_args: Vec<String>,
  #[serde(default)]
  extra_link_args: Vec<String>,
  define_macros: Option<RawMacros>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMacros {
  Map(BTreeMap<String, RawMacroValue>),
  List(Vec<Vec<String>>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMacroValue {
  Text(String),
  Integer(i64),
  Flag(bool),
}

impl RawMacros {
  fn into_macro_map(self, scope: &str) -> Result<MacroMap, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidMacro {
      scope: scope.to_string(),
      message,
    };

    let mut macros = MacroMap::new();
    match self {
      RawMacros::Map(entries) => {
        for (name, value) in entries {
          let value = match value {
            RawMacroValue::Text(text) => MacroValue::Value(text),
            RawMacroValue::Integer(n) => MacroValue::Value(n.to_string()),
            RawMacroValue::Flag(true) => MacroValue::NoValue,
            RawMacroValue::Flag(false) => {
              return Err(invalid(format!("{} = false (omit the macro instead)", name)));
            }
          };
          macros.define(name, value);
        }
      }
      RawMacros::List(entries) => {
        for entry in entries {
          let mut parts = entry.into_iter();
          match (parts.next(), parts.next(), parts.next()) {
            (Some(name), value, None) => macros.define(name, value),
            (None, _, _) => return Err(invalid("empty macro entry".to_string())),
            (Some(name), _, Some(_)) => {
              return Err(invalid(format!("{} has more than one value", name)));
            }
          }
        }
      }
    }
    Ok(macros)
  }
}

/// A loaded and resolved build file.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  /// Directory relative paths were resolved against.
  pub base_dir: PathBuf,
  pub language_level: LanguageLevel,
  pub build_dir: PathBuf,
  pub artifact_suffix: String,
  pub translator: TranslatorConfig,
  pub compiler: CompilerConfig,
  pub include_providers: Vec<ProviderConfig>,
  pub targets: Vec<BuildTarget>,
}

impl BuildConfig {
  /// Read and resolve a build file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let parent = match path.parent() {
      Some(p) if !p.as_os_str().is_empty() => p,
      _ => Path::new("."),
    };
    let base_dir = dunce::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());

    debug!(path = ?path, base_dir = ?base_dir, "loading build file");
    Self::from_toml_str(&content, &base_dir).map_err(|e| match e {
      ConfigError::Parse { source, .. } => ConfigError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })
  }

  /// Parse build-file content, resolving relative paths against `base_dir`.
  pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
    let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: PathBuf::from("<inline>"),
      source,
    })?;

    if raw.translator.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
      return Err(ConfigError::EmptyProgram { section: "translator" });
    }
    if raw.compiler.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
      return Err(ConfigError::EmptyProgram { section: "compiler" });
    }

    let include_providers = raw
      .include_providers
      .into_iter()
      .map(|provider| resolve_provider(provider, base_dir))
      .collect::<Result<Vec<_>, _>>()?;

    let shared_macros = match raw.define_macros {
      Some(macros) => macros.into_macro_map("top-level define_macros")?,
      None => MacroMap::new(),
    };

    let targets = raw
      .targets
      .into_iter()
      .map(|target| resolve_target(target, base_dir, &shared_macros))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      base_dir: base_dir.to_path_buf(),
      language_level: raw.language_level.unwrap_or_default(),
      build_dir: resolve_relative(base_dir, &raw.build_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR))),
      artifact_suffix: raw
        .artifact_suffix
        .unwrap_or_else(|| default_artifact_suffix().to_string()),
      translator: raw.translator,
      compiler: raw.compiler,
      include_providers,
      targets,
    })
  }

  pub fn layout(&self) -> BuildLayout {
    BuildLayout::new(&self.build_dir).with_suffix(&self.artifact_suffix)
  }

  pub fn command_translator(&self) -> CommandTranslator {
    let translator = match &self.translator.program {
      Some(program) => CommandTranslator::new(program),
      None => CommandTranslator::default(),
    };
    translator
      .with_args(self.translator.args.iter().cloned())
      .with_cplus(self.translator.cplus)
  }

  /// The configured compiler; `$CC` applies only when the file names none.
  pub fn command_compiler(&self) -> CommandCompiler {
    let compiler = match &self.compiler.program {
      Some(program) => CommandCompiler::new(program),
      None => CommandCompiler::from_env(),
    };
    match &self.compiler.args {
      Some(args) => compiler.with_base_args(args.iter().cloned()),
      None => compiler,
    }
  }

  pub fn include_providers(&self) -> Vec<Box<dyn IncludeProvider>> {
    self.include_providers.iter().map(build_provider).collect()
  }

  /// An orchestrator wired to the command-backed tools this file describes.
  pub fn orchestrator(&self) -> Orchestrator<CommandTranslator, CommandCompiler> {
    self
      .include_providers()
      .into_iter()
      .fold(
        Orchestrator::new(self.command_translator(), self.command_compiler(), self.layout()),
        Orchestrator::with_boxed_provider,
      )
  }
}

fn resolve_provider(mut provider: ProviderConfig, base_dir: &Path) -> Result<ProviderConfig, ConfigError> {
  let problem = match (&provider.command, &provider.dirs) {
    (Some(_), Some(_)) => Some("set either `command` or `dirs`, not both"),
    (None, None) => Some("one of `command` or `dirs` is required"),
    (Some(command), None) if command.first().is_none_or(|p| p.trim().is_empty()) => {
      Some("`command` must name a program")
    }
    _ => None,
  };
  if let Some(message) = problem {
    return Err(ConfigError::InvalidProvider {
      name: provider.name,
      message: message.to_string(),
    });
  }

  if let Some(dirs) = provider.dirs.as_mut() {
    for dir in dirs.iter_mut() {
      *dir = resolve_relative(base_dir, dir);
    }
  }
  Ok(provider)
}

fn build_provider(config: &ProviderConfig) -> Box<dyn IncludeProvider> {
  match (&config.command, &config.dirs) {
    (Some(command), _) => {
      let mut parts = command.iter().cloned();
      let program = parts.next().unwrap_or_default();
      Box::new(CommandIncludeProvider::new(
        &config.name,
        Invocation::new(program).args(parts),
      ))
    }
    (None, dirs) => Box::new(StaticIncludeProvider::new(
      &config.name,
      dirs.iter().flatten().cloned(),
    )),
  }
}

fn resolve_target(raw: RawTarget, base_dir: &Path, shared_macros: &MacroMap) -> Result<BuildTarget, ConfigError> {
  let Some(first) = raw.sources.first() else {
    return Err(ConfigError::NoSources(raw.name.unwrap_or_else(|| "(unnamed)".to_string())));
  };
  let name = match raw.name {
    Some(name) => name,
    None => first
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .ok_or_else(|| ConfigError::UnnamedTarget(first.clone()))?,
  };

  let mut macros = shared_macros.clone();
  if let Some(own) = raw.define_macros {
    macros.overlay(&own.into_macro_map(&format!("target '{}'", name))?);
  }
  let sources = raw.sources.iter().map(|src| resolve_relative(base_dir, src));

  Ok(
    BuildTarget::new(name, sources)
      .with_compile_args(raw.extra_compile_args)
      .with_link_args(raw.extra_link_args)
      .with_macros(macros),
  )
}
