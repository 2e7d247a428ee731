//! wasm-opt flag policy and invocation
//!
//! ## Key Types
//!
//! - `WasmOpt` - Runs an acquired wasm-opt over in-memory bytes
//! - `Optimize` - Seam used by the payload patcher
//!
//! ## Usage
//!
//! ```no_run
//! use wasm_inline_slim::optimizer::WasmOpt;
//!
//! let wasm = std::fs::read("module.wasm")?;
//! let optimized = WasmOpt::new("/path/to/wasm-opt").run(&wasm, &["-Oz".to_string()])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod flags;
pub mod runner;

pub use flags::{is_opt_level_flag, normalize_flags};
pub use runner::WasmOpt;

use crate::error::SlimError;

/// Turns a WebAssembly module into an optimized one
pub trait Optimize {
    /// Optimize `bytes`, passing `flags` through the flag policy
    fn optimize(&self, bytes: &[u8], flags: &[String]) -> Result<Vec<u8>, SlimError>;
}
