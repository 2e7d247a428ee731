//! Build command implementation
//!
//! Runs the generator, then the full rewrite-and-patch pipeline over the
//! glue file it produced.

use anyhow::Result;
use std::path::Path;

use crate::pipeline::{out_dir_from_args, Pipeline, PipelineReport, ResultFormatter};

use super::{apply_opt_level, load_config};

/// Main build command handler
///
/// `generator_args` are appended to the configured generator arguments; an
/// `--out <dir>` pair among them selects the directory holding the glue file.
///
/// # Examples
///
/// ```no_run
/// use wasm_inline_slim::cmd::build::cmd_build;
///
/// // Build into ./dist and print a JSON report
/// cmd_build(&["--out".to_string(), "dist".to_string()], None, None, true)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_build(
    generator_args: &[String],
    opt_level: Option<&str>,
    config_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_opt_level(&mut config, opt_level)?;

    let glue_file = config.glue_file(out_dir_from_args(generator_args).map(Path::new));
    let mut pipeline_config = config.pipeline_config(glue_file);
    pipeline_config.generator = Some(config.generator_config(generator_args));

    let report = Pipeline::new(pipeline_config).run()?;
    ResultFormatter::print_success(&report.glue_file);

    if json_output {
        present_json_report(&report)?;
    }

    Ok(())
}

/// Print the machine-readable report to stdout
pub(crate) fn present_json_report(report: &PipelineReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
