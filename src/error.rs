//! Error taxonomy with contextual suggestions
//!
//! Every fatal condition of a run is one [`SlimError`] variant. Transient
//! network failures never surface here: the fetcher retries them and only the
//! final outcome reaches the acquirer.
//!
//! # Examples
//!
//! ```
//! use wasm_inline_slim::error::SlimError;
//! use std::path::PathBuf;
//!
//! let err = SlimError::PayloadNotFound { path: PathBuf::from("lib/lz4.js") };
//! assert_eq!(err.exit_code(), 65);
//! assert!(err.suggestion().is_some());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::fmt::{glyph, CROSSMARK};

/// Boxed error source carried by acquisition failures.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal errors of the inline optimization pipeline
#[derive(Error, Debug)]
pub enum SlimError {
    /// No cache directory could be derived from the environment
    #[error("could not find a cache directory on {os}")]
    NoCacheDirectory {
        /// Host operating system identifier
        os: String,
    },

    /// The host OS/architecture has no published optimizer release
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Host operating system identifier
        os: String,
        /// Host architecture identifier
        arch: String,
    },

    /// Downloading or unpacking the optimizer failed
    #[error("failed to acquire {tool}: {reason}")]
    AcquisitionFailed {
        /// Tool being acquired
        tool: String,
        /// What went wrong
        reason: String,
        /// Underlying network or archive error
        #[source]
        source: Option<BoxedSource>,
    },

    /// The optimizer ran but exited unsuccessfully
    #[error("error executing {tool} ({status})")]
    OptimizerExecutionFailed {
        /// Tool that failed
        tool: String,
        /// Rendered exit status
        status: String,
    },

    /// The glue source has no embedded payload markers
    #[error("no base64 encoded bytes found in {path}")]
    PayloadNotFound {
        /// Glue file that was searched
        path: PathBuf,
    },

    /// The text between the payload markers is not valid base64
    #[error("invalid base64 payload in {path}")]
    InvalidPayload {
        /// Glue file holding the payload
        path: PathBuf,
        /// Decoder error
        #[source]
        source: base64::DecodeError,
    },

    /// The glue generator is not installed
    #[error("generator not found: {program}")]
    GeneratorMissing {
        /// Program that was looked up on PATH
        program: String,
    },

    /// The glue generator exited unsuccessfully
    #[error("failed to generate glue with `{command}` ({status})")]
    GeneratorFailed {
        /// Rendered command line
        command: String,
        /// Rendered exit status
        status: String,
    },

    /// Generic I/O error with context
    #[error("I/O error: {context}")]
    Io {
        /// Context about where the error occurred
        context: String,
        /// IO error source
        #[source]
        source: std::io::Error,
    },
}

impl SlimError {
    /// Wrap an I/O error with a description of the failed operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable suggestion for resolving this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use wasm_inline_slim::error::SlimError;
    ///
    /// let error = SlimError::NoCacheDirectory { os: "linux".to_string() };
    /// assert!(error.suggestion().unwrap().contains("XDG_CACHE_HOME"));
    /// ```
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NoCacheDirectory { .. } => Some(
                "Set XDG_CACHE_HOME or HOME (LOCALAPPDATA on Windows), or set [cache] dir in .wasm-inline-slim.toml"
                    .to_string(),
            ),
            Self::UnsupportedPlatform { .. } => Some(
                "Prebuilt wasm-opt is published for x86_64/arm64 on Linux, macOS and Windows"
                    .to_string(),
            ),
            Self::AcquisitionFailed { .. } => Some(
                "Check network access to github.com, then delete the cache directory and retry"
                    .to_string(),
            ),
            Self::OptimizerExecutionFailed { .. } => {
                Some("See the wasm-opt diagnostics above; try a lower --opt-level".to_string())
            }
            Self::PayloadNotFound { path } => Some(format!(
                "Ensure {} was generated with inlined WebAssembly (const bytes = base64decode(\"...\");)",
                path.display()
            )),
            Self::InvalidPayload { path, .. } => Some(format!(
                "Regenerate {} from a clean build",
                path.display()
            )),
            Self::GeneratorMissing { program } => {
                Some(format!("Install {} and make sure it is on PATH", program))
            }
            Self::GeneratorFailed { .. } => {
                Some("Check the generator output above and fix the build".to_string())
            }
            Self::Io { context, .. } => Some(format!(
                "Check file permissions and that {} is accessible",
                context
            )),
        }
    }

    /// Get appropriate exit code for this error.
    ///
    /// Codes follow sysexits.h conventions and are always non-zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use wasm_inline_slim::error::SlimError;
    ///
    /// let error = SlimError::GeneratorMissing { program: "deno".to_string() };
    /// assert_eq!(error.exit_code(), 127);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCacheDirectory { .. } => 78,           // EX_CONFIG
            Self::UnsupportedPlatform { .. } => 69,        // EX_UNAVAILABLE
            Self::AcquisitionFailed { .. } => 69,          // EX_UNAVAILABLE
            Self::OptimizerExecutionFailed { .. } => 1,    // Generic error
            Self::PayloadNotFound { .. } => 65,            // EX_DATAERR
            Self::InvalidPayload { .. } => 65,             // EX_DATAERR
            Self::GeneratorMissing { .. } => 127,          // Command not found
            Self::GeneratorFailed { .. } => 1,             // Generic error
            Self::Io { .. } => 74,                         // EX_IOERR
        }
    }
}

/// Error formatter with colors and structured output
pub struct ErrorFormatter;

impl ErrorFormatter {
    /// Format error with its cause chain and suggestion
    pub fn format(error: &anyhow::Error) -> String {
        use console::style;

        let mut output = String::new();

        output.push_str(&format!(
            " {} {}: {}\n",
            glyph(&CROSSMARK),
            style("Error").red().bold(),
            error
        ));

        let mut source = error.source();
        let mut indent = 1;
        while let Some(err) = source {
            output.push_str(&format!(
                "{}{} {}\n",
                "  ".repeat(indent),
                style("caused by:").yellow(),
                err
            ));
            source = err.source();
            indent += 1;
        }

        if let Some(slim_error) = Self::find(error) {
            if let Some(suggestion) = slim_error.suggestion() {
                output.push_str(&format!(
                    "\n{} {}\n",
                    style("help:").cyan().bold(),
                    suggestion
                ));
            }
        }

        output
    }

    /// Exit code for an error, falling back to 1 when no [`SlimError`] is in the chain
    pub fn exit_code(error: &anyhow::Error) -> i32 {
        Self::find(error).map(SlimError::exit_code).unwrap_or(1)
    }

    fn find(error: &anyhow::Error) -> Option<&SlimError> {
        error.chain().find_map(|e| e.downcast_ref::<SlimError>())
    }
}
