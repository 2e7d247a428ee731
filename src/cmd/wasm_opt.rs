//! wasm-opt command implementation
//!
//! Runs the cached optimizer over a standalone `.wasm` file.

use anyhow::{Context, Result};
use console::style;
use std::io::Write;
use std::path::Path;

use crate::fetch::{RetryingFetcher, UreqClient};
use crate::fmt::{format_bytes, glyph, ARROW, CHECKMARK};
use crate::infra::ProcessEnvironment;
use crate::optimizer::WasmOpt;
use crate::platform::Platform;
use crate::tools::{ToolAcquirer, ToolRelease};

use super::load_config;

/// Optimize `file` with `flags`, writing to `output` or stdout
///
/// The flag policy applies: `-Os` when no level is given, and the required
/// feature flags.
///
/// # Examples
///
/// ```no_run
/// use wasm_inline_slim::cmd::cmd_wasm_opt;
/// use std::path::Path;
///
/// cmd_wasm_opt(
///     Path::new("module.wasm"),
///     &["-Oz".to_string()],
///     Some(Path::new("module.opt.wasm")),
///     None,
/// )?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn cmd_wasm_opt(
    file: &Path,
    flags: &[String],
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let input =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let acquirer = ToolAcquirer::locate(
        ToolRelease::binaryen(config.wasm_opt.version.clone()),
        Platform::current(),
        &ProcessEnvironment,
        config.cache.dir.as_deref(),
        &config.cache.namespace,
        RetryingFetcher::new(UreqClient::new(), config.wasm_opt.max_retries),
    )?;
    let binary = acquirer.ensure_binary()?;
    let optimized = WasmOpt::new(binary).run(&input, flags)?;

    match output {
        Some(path) => {
            std::fs::write(path, &optimized)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                " {} {} {} {} ({})",
                style(format!("{} Optimized", glyph(&CHECKMARK))).green().bold(),
                style(format_bytes(input.len() as u64)).red(),
                glyph(&ARROW),
                style(format_bytes(optimized.len() as u64)).green().bold(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&optimized)
                .and_then(|_| stdout.flush())
                .context("Failed to write optimized module to stdout")?;
        }
    }

    Ok(())
}
