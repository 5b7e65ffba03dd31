//! Build target definitions.
//!
//! A [`BuildTarget`] is one source-to-artifact unit: a module name, the sources
//! that make it up, and the extra flags and macros handed to the toolchain.
//! Targets are immutable once constructed; the builder methods consume `self`.
//!
//! # Submodules
//!
//! - [`macros`] - Canonical preprocessor macro mapping
//! - `types` - Targets and translation language levels

pub mod macros;
mod types;

pub use macros::{MacroMap, MacroValue};
pub use types::*;
