//! Common test utilities and helpers
//!
//! This module provides shared functionality for integration tests:
//! - Glue project fixtures with an inline payload and an internal module
//! - A shell-script stand-in for wasm-opt placed in a private tool cache
//!
//! # Usage
//!
//! ```rust,no_run
//! mod common;
//! use common::fixtures::GlueProject;
//!
//! let project = GlueProject::new(&[0u8; 64]);
//! project.install_fake_wasm_opt(common::fixtures::TRUNCATING_WASM_OPT);
//! ```

pub mod fixtures;

use assert_cmd::Command;

/// Helper to get the wasm-inline-slim binary command
#[allow(dead_code)]
pub fn get_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wasm-inline-slim"))
}
