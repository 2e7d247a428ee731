//! wasm-opt invocation over scoped temporary files

use std::path::PathBuf;

use tempfile::{Builder, TempPath};

use crate::error::SlimError;
use crate::infra::{CommandExecutor, RealCommandExecutor};

use super::flags::normalize_flags;
use super::Optimize;

/// Runs an acquired wasm-opt executable
///
/// Input and output live in temporary files that are removed when the call
/// returns, whether the optimizer succeeded or not.
pub struct WasmOpt<CE: CommandExecutor = RealCommandExecutor> {
    binary: PathBuf,
    cmd_executor: CE,
}

impl WasmOpt<RealCommandExecutor> {
    /// Runner for the executable at `binary`
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self::with_executor(binary, RealCommandExecutor)
    }
}

impl<CE: CommandExecutor> WasmOpt<CE> {
    /// Runner with a custom command executor
    pub fn with_executor(binary: impl Into<PathBuf>, cmd_executor: CE) -> Self {
        Self {
            binary: binary.into(),
            cmd_executor,
        }
    }

    /// Optimize `bytes` with `flags` after applying the flag policy
    ///
    /// Invoked as `<binary> [flags...] <input> -o <output>` with inherited
    /// standard streams.
    ///
    /// # Errors
    /// - [`SlimError::Io`] when the temp files cannot be used or the process
    ///   cannot be spawned
    /// - [`SlimError::OptimizerExecutionFailed`] on a non-zero exit
    pub fn run(&self, bytes: &[u8], flags: &[String]) -> Result<Vec<u8>, SlimError> {
        let input = scoped_temp_file(".wasm")?;
        let output = scoped_temp_file(".opt.wasm")?;

        std::fs::write(&input, bytes)
            .map_err(|e| SlimError::io("writing optimizer input", e))?;

        let args = normalize_flags(flags);
        log::debug!("{} {}", self.binary.display(), args.join(" "));

        let status = self
            .cmd_executor
            .run(
                |cmd| cmd.args(&args).arg(&*input).arg("-o").arg(&*output),
                &self.binary,
            )
            .map_err(|e| SlimError::io(format!("spawning {}", self.binary.display()), e))?;

        if !status.success() {
            return Err(SlimError::OptimizerExecutionFailed {
                tool: "wasm-opt".to_string(),
                status: status.to_string(),
            });
        }

        std::fs::read(&output).map_err(|e| SlimError::io("reading optimizer output", e))
    }
}

impl<CE: CommandExecutor> Optimize for WasmOpt<CE> {
    fn optimize(&self, bytes: &[u8], flags: &[String]) -> Result<Vec<u8>, SlimError> {
        self.run(bytes, flags)
    }
}

/// Create a closed temporary file that is deleted on drop
fn scoped_temp_file(suffix: &str) -> Result<TempPath, SlimError> {
    Builder::new()
        .prefix("wasm-inline-slim-")
        .suffix(suffix)
        .tempfile()
        .map(|file| file.into_temp_path())
        .map_err(|e| SlimError::io("creating temporary file", e))
}
