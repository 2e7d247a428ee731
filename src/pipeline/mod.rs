//! Build pipeline orchestration module
//!
//! Implements the post-build pipeline for inline WebAssembly glue:
//! 1. generate the glue with the configured generator (optional)
//! 2. replace wildcard re-exports of internal modules with named exports
//! 3. optimize the embedded base64 payload with wasm-opt
//! 4. save the glue file atomically and report the savings

pub mod config;
pub mod executor;
pub mod metrics;
pub mod result_formatter;

pub use config::{
    glue_path, out_dir_from_args, GeneratorConfig, PipelineConfig, DEFAULT_GENERATOR_ARGS,
    DEFAULT_GENERATOR_PROGRAM, DEFAULT_MODULE, DEFAULT_OUT_DIR,
};
pub use executor::Pipeline;
pub use metrics::{PipelineReport, SizeMetrics};
pub use result_formatter::ResultFormatter;
