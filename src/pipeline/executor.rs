//! Pipeline driver
//!
//! Runs the stages of one build in order:
//! 1. the glue generator (optional)
//! 2. wildcard re-export rewriting
//! 3. optimizer acquisition and payload patching
//! 4. atomic write-back of the glue file

use std::path::PathBuf;

use crate::error::SlimError;
use crate::fetch::{HttpClient, RetryingFetcher, Sleeper, ThreadSleeper, UreqClient};
use crate::glue::{ExportRewriter, GlueSource, PayloadPatcher};
use crate::infra::{CommandExecutor, Environment, ProcessEnvironment, RealCommandExecutor};
use crate::optimizer::{Optimize, WasmOpt};
use crate::platform::Platform;
use crate::tools::{ToolAcquirer, ToolRelease};

use super::config::{GeneratorConfig, PipelineConfig};
use super::metrics::PipelineReport;
use super::result_formatter::ResultFormatter;

/// Drives generation, rewriting and patching of one glue file
pub struct Pipeline<
    C: HttpClient = UreqClient,
    CE: CommandExecutor = RealCommandExecutor,
    E: Environment = ProcessEnvironment,
    S: Sleeper = ThreadSleeper,
> {
    config: PipelineConfig,
    platform: Platform,
    env: E,
    cmd_executor: CE,
    client: C,
    sleeper: S,
}

impl Pipeline {
    /// Pipeline for the current host with real I/O
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wasm_inline_slim::pipeline::{Pipeline, PipelineConfig};
    ///
    /// let report = Pipeline::new(PipelineConfig::default()).run()?;
    /// println!("saved {:.2}%", report.reduction_percent);
    /// # Ok::<(), wasm_inline_slim::error::SlimError>(())
    /// ```
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_parts(
            config,
            Platform::current(),
            ProcessEnvironment,
            RealCommandExecutor,
            UreqClient::new(),
            ThreadSleeper,
        )
    }
}

impl<C, CE, E, S> Pipeline<C, CE, E, S>
where
    C: HttpClient,
    CE: CommandExecutor + Clone,
    E: Environment,
    S: Sleeper,
{
    /// Pipeline with injected platform, environment and I/O implementations
    pub fn with_parts(
        config: PipelineConfig,
        platform: Platform,
        env: E,
        cmd_executor: CE,
        client: C,
        sleeper: S,
    ) -> Self {
        Self {
            config,
            platform,
            env,
            cmd_executor,
            client,
            sleeper,
        }
    }

    /// Run every stage and write the result back to the glue file
    ///
    /// Nothing is written unless every stage succeeds.
    ///
    /// # Errors
    /// Any [`SlimError`]; the glue file on disk is unchanged in that case.
    pub fn run(self) -> Result<PipelineReport, SlimError> {
        if let Some(generator) = &self.config.generator {
            run_generator(generator, &self.cmd_executor)?;
        }

        let mut glue = GlueSource::load(&self.config.glue_file)?;
        let original_size = glue.len() as u64;

        let rewrite = ExportRewriter::new().rewrite(&glue)?;
        glue.set_text(rewrite.text);

        let acquirer = ToolAcquirer::locate(
            ToolRelease::binaryen(self.config.tool_version.clone()),
            self.platform.clone(),
            &self.env,
            self.config.cache_dir.as_deref(),
            &self.config.cache_namespace,
            RetryingFetcher::with_sleeper(self.client, self.sleeper, self.config.max_retries),
        )?;
        let optimizer = AcquiringOptimizer {
            acquirer: &acquirer,
            cmd_executor: self.cmd_executor.clone(),
        };

        let outcome = PayloadPatcher::new(&optimizer)
            .with_opt_level(self.config.opt_level.clone())
            .with_flags(self.config.extra_flags.clone())
            .patch(&glue)?;
        ResultFormatter::print_optimized(&outcome.metrics);

        glue.set_text(outcome.text);
        glue.save()?;

        let mut metrics = outcome.metrics;
        metrics.before_bytes = original_size;
        Ok(PipelineReport::new(
            glue.path().to_path_buf(),
            metrics,
            rewrite.rewritten,
        ))
    }
}

/// Acquires the optimizer on first use so malformed glue never triggers a download
struct AcquiringOptimizer<'a, C: HttpClient, S: Sleeper, CE: CommandExecutor> {
    acquirer: &'a ToolAcquirer<C, S>,
    cmd_executor: CE,
}

impl<C: HttpClient, S: Sleeper, CE: CommandExecutor + Clone> Optimize
    for AcquiringOptimizer<'_, C, S, CE>
{
    fn optimize(&self, bytes: &[u8], flags: &[String]) -> Result<Vec<u8>, SlimError> {
        let binary = self.acquirer.ensure_binary()?;
        WasmOpt::with_executor(binary, self.cmd_executor.clone()).run(bytes, flags)
    }
}

/// Resolve and run the generator with inherited standard streams
fn run_generator<CE: CommandExecutor>(
    generator: &GeneratorConfig,
    cmd_executor: &CE,
) -> Result<(), SlimError> {
    let program: PathBuf =
        which::which(&generator.program).map_err(|_| SlimError::GeneratorMissing {
            program: generator.program.clone(),
        })?;
    log::debug!("running {}", generator.command_line());

    let status = cmd_executor
        .run(|cmd| cmd.args(&generator.args), &program)
        .map_err(|e| SlimError::io(format!("spawning {}", program.display()), e))?;

    if !status.success() {
        return Err(SlimError::GeneratorFailed {
            command: generator.command_line(),
            status: status.to_string(),
        });
    }
    Ok(())
}
