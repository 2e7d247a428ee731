//! Inline WebAssembly payload patching
//!
//! The glue embeds its module as
//!
//! ```text
//! const bytes = base64decode("AGFzbQEAAAAB...\
//! ...");
//! ```
//!
//! [`PayloadPatcher`] decodes that block, runs the optimizer over it and
//! splices the re-encoded result back between the same markers.

use std::ops::Range;
use std::path::Path;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::SlimError;
use crate::optimizer::Optimize;
use crate::pipeline::SizeMetrics;

use super::GlueSource;

/// Text immediately before the payload
pub const START_MARKER: &str = "const bytes = base64decode(\"";

/// Text immediately after the payload
pub const END_MARKER: &str = "\");\n";

/// Characters per wrapped payload line
pub const WRAP_WIDTH: usize = 77;

/// Joins wrapped payload lines inside the string literal
pub const LINE_CONTINUATION: &str = "\\\n";

/// Optimization level used for the payload unless overridden
pub const DEFAULT_OPT_LEVEL: &str = "-O4";

/// Standard alphabet; padding is emitted and optional on input
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a wrapped payload, ignoring continuations and whitespace
pub fn decode_wrapped(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| *c != '\\' && !c.is_whitespace())
        .collect();
    ENGINE.decode(compact)
}

/// Encode bytes and wrap them at [`WRAP_WIDTH`] columns
///
/// Every complete 77-character chunk is followed by a line continuation.
///
/// # Examples
///
/// ```
/// use wasm_inline_slim::glue::{decode_wrapped, encode_wrapped};
///
/// let bytes = vec![0u8; 100];
/// let encoded = encode_wrapped(&bytes);
/// assert!(encoded.lines().all(|line| line.trim_end_matches('\\').len() <= 77));
/// assert_eq!(decode_wrapped(&encoded).unwrap(), bytes);
/// ```
pub fn encode_wrapped(bytes: &[u8]) -> String {
    let encoded = ENGINE.encode(bytes);
    let full_chunks = encoded.len() / WRAP_WIDTH;
    let mut out = String::with_capacity(encoded.len() + full_chunks * LINE_CONTINUATION.len());

    // base64 output is ASCII, so every byte offset is a char boundary
    let mut rest = encoded.as_str();
    while rest.len() >= WRAP_WIDTH {
        let (chunk, tail) = rest.split_at(WRAP_WIDTH);
        out.push_str(chunk);
        out.push_str(LINE_CONTINUATION);
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Decoded payload and where its encoded form sits in the glue text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPayload {
    /// Byte range of the encoded text between the markers
    pub span: Range<usize>,
    /// Decoded module bytes
    pub bytes: Vec<u8>,
}

impl EmbeddedPayload {
    /// Byte range of the encoded payload, if both markers are present
    ///
    /// The end marker is searched for after the start marker.
    pub fn locate(text: &str) -> Option<Range<usize>> {
        let start = text.find(START_MARKER)? + START_MARKER.len();
        let end = start + text[start..].find(END_MARKER)?;
        Some(start..end)
    }

    /// Find and decode the payload of `text` read from `path`
    ///
    /// # Errors
    /// - [`SlimError::PayloadNotFound`] if either marker is missing
    /// - [`SlimError::InvalidPayload`] if the text between them is not base64
    pub fn extract(text: &str, path: &Path) -> Result<Self, SlimError> {
        let span = Self::locate(text).ok_or_else(|| SlimError::PayloadNotFound {
            path: path.to_path_buf(),
        })?;
        let bytes =
            decode_wrapped(&text[span.clone()]).map_err(|source| SlimError::InvalidPayload {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { span, bytes })
    }
}

/// Patched glue text and the size change of the whole text
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// Glue text with the optimized payload spliced in
    pub text: String,
    /// Glue text size before and after, in bytes
    pub metrics: SizeMetrics,
}

/// Replaces the embedded payload with its optimized form
pub struct PayloadPatcher<'o, O: Optimize + ?Sized> {
    optimizer: &'o O,
    opt_level: String,
    extra_flags: Vec<String>,
}

impl<'o, O: Optimize + ?Sized> PayloadPatcher<'o, O> {
    /// Patcher running `optimizer` at [`DEFAULT_OPT_LEVEL`]
    pub fn new(optimizer: &'o O) -> Self {
        Self {
            optimizer,
            opt_level: DEFAULT_OPT_LEVEL.to_string(),
            extra_flags: Vec::new(),
        }
    }

    /// Override the optimization level
    pub fn with_opt_level(mut self, opt_level: impl Into<String>) -> Self {
        self.opt_level = opt_level.into();
        self
    }

    /// Pass additional flags to the optimizer after the level
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.extra_flags = flags;
        self
    }

    /// Flags handed to the optimizer
    pub fn flags(&self) -> Vec<String> {
        std::iter::once(self.opt_level.clone())
            .chain(self.extra_flags.iter().cloned())
            .collect()
    }

    /// Optimize the payload of `source` and return the patched text
    ///
    /// `source` itself is not modified. Everything outside the payload span
    /// is carried over unchanged.
    ///
    /// # Errors
    /// - [`SlimError::PayloadNotFound`] / [`SlimError::InvalidPayload`] for a
    ///   malformed glue file
    /// - any error of the optimizer
    pub fn patch(&self, source: &GlueSource) -> Result<PatchOutcome, SlimError> {
        let text = source.text();
        let payload = EmbeddedPayload::extract(text, source.path())?;
        log::debug!(
            "payload of {} decodes to {} bytes",
            source.path().display(),
            payload.bytes.len()
        );

        let optimized = self.optimizer.optimize(&payload.bytes, &self.flags())?;
        let encoded = encode_wrapped(&optimized);

        let mut patched =
            String::with_capacity(text.len() - payload.span.len() + encoded.len());
        patched.push_str(&text[..payload.span.start]);
        patched.push_str(&encoded);
        patched.push_str(&text[payload.span.end..]);

        let metrics = SizeMetrics {
            before_bytes: text.len() as u64,
            after_bytes: patched.len() as u64,
        };
        Ok(PatchOutcome {
            text: patched,
            metrics,
        })
    }
}
