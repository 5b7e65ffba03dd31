//! CLI integration tests that run real builds.
//!
//! Shell scripts stand in for the translator and the C compiler, so these
//! only run on Unix.

#![cfg(unix)]

mod build_tests;
mod common;
