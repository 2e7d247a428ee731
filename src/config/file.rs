//! Configuration file data structures

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_MAX_RETRIES;
use crate::glue::DEFAULT_OPT_LEVEL;
use crate::optimizer::is_opt_level_flag;
use crate::pipeline::{
    glue_path, GeneratorConfig, PipelineConfig, DEFAULT_GENERATOR_ARGS,
    DEFAULT_GENERATOR_PROGRAM, DEFAULT_MODULE, DEFAULT_OUT_DIR,
};
use crate::tools::{DEFAULT_BINARYEN_VERSION, DEFAULT_CACHE_NAMESPACE};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = ".wasm-inline-slim.toml";

/// wasm-inline-slim configuration file structure
///
/// Every section and key is optional.
///
/// ```toml
/// [generator]
/// program = "deno"
/// out-dir = "lib"
/// module = "lz4"
///
/// [wasm-opt]
/// version = "version_121"
/// opt-level = "-O4"
/// flags = ["--strip-debug"]
/// max-retries = 5
///
/// [cache]
/// namespace = "wasm-inline-slim"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Glue generator settings
    pub generator: GeneratorSettings,

    /// Optimizer settings
    #[serde(rename = "wasm-opt")]
    pub wasm_opt: WasmOptSettings,

    /// Tool cache settings
    pub cache: CacheSettings,
}

/// `[generator]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneratorSettings {
    /// Program to run
    pub program: String,
    /// Arguments placed before any given on the command line
    pub args: Vec<String>,
    /// Directory the generator writes into
    pub out_dir: PathBuf,
    /// Module name; the glue file is `<out-dir>/<module>.js`
    pub module: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_GENERATOR_PROGRAM.to_string(),
            args: DEFAULT_GENERATOR_ARGS.iter().map(|a| a.to_string()).collect(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            module: DEFAULT_MODULE.to_string(),
        }
    }
}

/// `[wasm-opt]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WasmOptSettings {
    /// Binaryen release tag
    pub version: String,
    /// Optimization level for the embedded payload
    pub opt_level: String,
    /// Additional flags
    pub flags: Vec<String>,
    /// Download retry budget
    pub max_retries: u32,
}

impl Default for WasmOptSettings {
    fn default() -> Self {
        Self {
            version: DEFAULT_BINARYEN_VERSION.to_string(),
            opt_level: DEFAULT_OPT_LEVEL.to_string(),
            flags: Vec::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheSettings {
    /// Cache base overriding the platform cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Subdirectory of the cache base
    pub namespace: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
        }
    }
}

impl ConfigFile {
    /// Check values that deserialize but cannot work
    pub fn validate(&self) -> Result<()> {
        if !is_opt_level_flag(&self.wasm_opt.opt_level) {
            anyhow::bail!(
                "opt-level '{}' must start with -O or --opt",
                self.wasm_opt.opt_level
            );
        }
        if self.wasm_opt.version.trim().is_empty() {
            anyhow::bail!("wasm-opt version must not be empty");
        }
        if self.cache.namespace.trim().is_empty() {
            anyhow::bail!("cache namespace must not be empty");
        }
        Ok(())
    }

    /// Glue file for the configured (or overridden) output directory
    pub fn glue_file(&self, out_dir_override: Option<&Path>) -> PathBuf {
        let out_dir = out_dir_override.unwrap_or(&self.generator.out_dir);
        glue_path(out_dir, &self.generator.module)
    }

    /// Generator command with `extra_args` appended to the configured ones
    pub fn generator_config(&self, extra_args: &[String]) -> GeneratorConfig {
        GeneratorConfig {
            program: self.generator.program.clone(),
            args: self
                .generator
                .args
                .iter()
                .chain(extra_args)
                .cloned()
                .collect(),
        }
    }

    /// Pipeline settings for `glue_file`, without a generator stage
    pub fn pipeline_config(&self, glue_file: PathBuf) -> PipelineConfig {
        PipelineConfig {
            generator: None,
            glue_file,
            opt_level: self.wasm_opt.opt_level.clone(),
            extra_flags: self.wasm_opt.flags.clone(),
            tool_version: self.wasm_opt.version.clone(),
            max_retries: self.wasm_opt.max_retries,
            cache_dir: self.cache.dir.clone(),
            cache_namespace: self.cache.namespace.clone(),
        }
    }
}
