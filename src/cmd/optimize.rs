//! Optimize command implementation
//!
//! Rewrites and patches an already generated glue file.

use anyhow::Result;
use std::path::Path;

use crate::pipeline::{Pipeline, ResultFormatter};

use super::build::present_json_report;
use super::{apply_opt_level, load_config};

/// Rewrite exports and optimize the inline payload of `path`
///
/// Without `path` the configured `<out-dir>/<module>.js` is used.
///
/// # Examples
///
/// ```no_run
/// use wasm_inline_slim::cmd::cmd_optimize;
/// use std::path::Path;
///
/// cmd_optimize(Some(Path::new("lib/lz4.js")), Some("-Oz"), None, false)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_optimize(
    path: Option<&Path>,
    opt_level: Option<&str>,
    config_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_opt_level(&mut config, opt_level)?;

    let glue_file = match path {
        Some(path) => path.to_path_buf(),
        None => config.glue_file(None),
    };

    let report = Pipeline::new(config.pipeline_config(glue_file)).run()?;
    ResultFormatter::print_success(&report.glue_file);

    if json_output {
        present_json_report(&report)?;
    }

    Ok(())
}
