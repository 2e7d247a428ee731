//! Command handlers for wasm-inline-slim CLI
//!
//! Each submodule handles a specific CLI command.

pub mod build;
pub mod completions;
pub mod optimize;
pub mod wasm_opt;

pub use build::cmd_build;
pub use completions::cmd_completions;
pub use optimize::cmd_optimize;
pub use wasm_opt::cmd_wasm_opt;

use anyhow::Result;
use std::path::Path;

use crate::config::{ConfigFile, ConfigLoader};

/// Load `--config` if given, else `.wasm-inline-slim.toml` in the current directory
pub(crate) fn load_config(config_path: Option<&Path>) -> Result<ConfigFile> {
    match config_path {
        Some(path) => ConfigLoader::load_file(path),
        None => ConfigLoader::load(Path::new(".")),
    }
}

/// Replace the configured opt-level with a command-line one
pub(crate) fn apply_opt_level(config: &mut ConfigFile, opt_level: Option<&str>) -> Result<()> {
    if let Some(level) = opt_level {
        config.wasm_opt.opt_level = level.to_string();
        config.validate()?;
    }
    Ok(())
}
