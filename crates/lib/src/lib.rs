//! extbuild-lib: Native-extension build orchestration
//!
//! This crate turns annotated high-level sources into loadable native modules:
//! - `BuildTarget`: one source-to-artifact unit with its flags and macros
//! - `Orchestrator`: runs targets through translate → compile/link
//! - `Translator`, `CompilerLinker`, `IncludeProvider`: injected external tools
//! - `BuildConfig`: the `extbuild.toml` build file

pub mod compile;
pub mod config;
pub mod consts;
pub mod exec;
pub mod orchestrator;
pub mod provider;
pub mod target;
pub mod translate;
pub mod util;

pub use compile::{CommandCompiler, CompileRequest, CompilerLinker};
pub use config::{BuildConfig, ConfigError};
pub use exec::Diagnostic;
pub use orchestrator::{
  BuildError, BuildLayout, BuildOutcome, BuildResult, Orchestrator, PlanError, TargetError, TargetPlan, TargetState,
  all_succeeded,
};
pub use provider::{CommandIncludeProvider, IncludeProvider, StaticIncludeProvider};
pub use target::{BuildTarget, LanguageLevel, MacroMap, MacroValue};
pub use translate::{CommandTranslator, TranslateRequest, TranslatedSource, Translator};
