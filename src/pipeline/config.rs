//! Pipeline configuration types

use std::path::{Path, PathBuf};

use crate::fetch::DEFAULT_MAX_RETRIES;
use crate::glue::DEFAULT_OPT_LEVEL;
use crate::tools::{DEFAULT_BINARYEN_VERSION, DEFAULT_CACHE_NAMESPACE};

/// Default generator program
pub const DEFAULT_GENERATOR_PROGRAM: &str = "deno";

/// Default generator arguments, before any user-supplied ones
pub const DEFAULT_GENERATOR_ARGS: &[&str] = &[
    "run",
    "-Aq",
    "--no-config",
    "jsr:@deno/wasmbuild@0.19.1",
    "--inline",
    "--skip-opt",
];

/// Default directory the generator writes into
pub const DEFAULT_OUT_DIR: &str = "lib";

/// Default module name; the glue file is `<out-dir>/<module>.js`
pub const DEFAULT_MODULE: &str = "lz4";

/// Command that produces the glue file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Program name or path
    pub program: String,
    /// Full argument list
    pub args: Vec<String>,
}

impl GeneratorConfig {
    /// Command line for diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_GENERATOR_PROGRAM.to_string(),
            args: DEFAULT_GENERATOR_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Generator to run first; `None` works on an existing glue file
    pub generator: Option<GeneratorConfig>,
    /// Glue file to rewrite and patch
    pub glue_file: PathBuf,
    /// Optimization level for the embedded payload
    pub opt_level: String,
    /// Additional optimizer flags
    pub extra_flags: Vec<String>,
    /// Optimizer release tag
    pub tool_version: String,
    /// Download retry budget
    pub max_retries: u32,
    /// Cache base overriding the platform cache directory
    pub cache_dir: Option<PathBuf>,
    /// Subdirectory of the cache base owned by this tool
    pub cache_namespace: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generator: None,
            glue_file: glue_path(Path::new(DEFAULT_OUT_DIR), DEFAULT_MODULE),
            opt_level: DEFAULT_OPT_LEVEL.to_string(),
            extra_flags: Vec::new(),
            tool_version: DEFAULT_BINARYEN_VERSION.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            cache_dir: None,
            cache_namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
        }
    }
}

/// Glue file written by the generator for `module` into `out_dir`
pub fn glue_path(out_dir: &Path, module: &str) -> PathBuf {
    out_dir.join(format!("{module}.js"))
}

/// Value following `--out` in generator arguments
///
/// ```
/// use wasm_inline_slim::pipeline::out_dir_from_args;
///
/// let args = vec!["--out".to_string(), "dist".to_string()];
/// assert_eq!(out_dir_from_args(&args), Some("dist"));
/// assert_eq!(out_dir_from_args(&args[..1]), None);
/// ```
pub fn out_dir_from_args(args: &[String]) -> Option<&str> {
    let index = args.iter().position(|a| a == "--out")?;
    args.get(index + 1).map(String::as_str)
}
