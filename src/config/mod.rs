//! Project configuration for wasm-inline-slim
//!
//! This module provides:
//! - .wasm-inline-slim.toml config file support
//! - conversion of file settings into pipeline settings

pub mod file;
pub mod loader;

pub use file::{CacheSettings, ConfigFile, GeneratorSettings, WasmOptSettings, CONFIG_FILE_NAME};
pub use loader::ConfigLoader;
