#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! wasm-inline-slim library
//!
//! Post-build processing for JavaScript glue that carries its WebAssembly
//! module inline as base64. It can be used programmatically in addition to
//! the CLI interface.
//!
//! # Basic Example
//!
//! Rewriting the public exports of a glue file:
//!
//! ```
//! use wasm_inline_slim::glue::{ExportRewriter, GlueSource};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let dir = TempDir::new().unwrap();
//! fs::write(
//!     dir.path().join("lz4.internal.js"),
//!     "export function compress() {}\nexport function __wbg_init() {}\n",
//! ).unwrap();
//! let glue = GlueSource::new(
//!     dir.path().join("lz4.js"),
//!     "export * from \"./lz4.internal.js\";\n",
//! );
//!
//! let rewrite = ExportRewriter::new().rewrite(&glue).unwrap();
//! assert_eq!(
//!     rewrite.text,
//!     "export {\n  compress,\n} from \"./lz4.internal.js\";\n"
//! );
//! ```
//!
//! # Advanced Example: Patching the Inline Module
//!
//! Any [`optimizer::Optimize`] implementation can stand in for wasm-opt:
//!
//! ```
//! use wasm_inline_slim::error::SlimError;
//! use wasm_inline_slim::glue::{encode_wrapped, GlueSource, PayloadPatcher};
//! use wasm_inline_slim::optimizer::Optimize;
//!
//! struct Truncate;
//!
//! impl Optimize for Truncate {
//!     fn optimize(&self, bytes: &[u8], _flags: &[String]) -> Result<Vec<u8>, SlimError> {
//!         Ok(bytes[..8].to_vec())
//!     }
//! }
//!
//! let text = format!(
//!     "const bytes = base64decode(\"{}\");\n",
//!     encode_wrapped(&[0u8; 300])
//! );
//! let glue = GlueSource::new("lib/lz4.js", text);
//!
//! let outcome = PayloadPatcher::new(&Truncate).patch(&glue).unwrap();
//! assert!(outcome.metrics.reduction_percent() > 80.0);
//! ```

/// Streaming extraction of release archives
pub mod archive;
/// Command handlers for CLI operations
pub mod cmd;
/// Configuration file support
pub mod config;
/// Enhanced error types with contextual suggestions
pub mod error;
/// HTTP fetching with retries
pub mod fetch;
/// Shared formatting utilities
pub mod fmt;
/// Generated JavaScript glue and its transformations
pub mod glue;
/// Infrastructure traits for filesystem, environment and command execution
pub mod infra;
/// wasm-opt flag policy and invocation
pub mod optimizer;
/// Build pipeline orchestration
pub mod pipeline;
/// Host platform identification and cache directories
pub mod platform;
/// Optimizer acquisition and caching
pub mod tools;
