//! Generated JavaScript glue and the two in-place transformations applied to it
//!
//! ## Key Types
//!
//! - `GlueSource` - One glue file held in memory between load and save
//! - `ExportRewriter` - Replaces wildcard re-exports of internal modules
//! - `PayloadPatcher` - Optimizes the inline base64 WebAssembly payload
//!
//! The file on disk is only touched by [`GlueSource::save`], which replaces
//! it atomically. A run that fails before the save leaves the original bytes
//! in place.

pub mod exports;
pub mod payload;

pub use exports::{
    find_reexports, format_named_exports, parse_reexport, scan_exports, ExportRewrite,
    ExportRewriter, ReExportDirective,
};
pub use payload::{
    decode_wrapped, encode_wrapped, EmbeddedPayload, PatchOutcome, PayloadPatcher,
    DEFAULT_OPT_LEVEL, END_MARKER, START_MARKER, WRAP_WIDTH,
};

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::SlimError;
use crate::infra::{FileSystem, RealFileSystem};

/// A glue file and its current (possibly rewritten) text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueSource {
    path: PathBuf,
    text: String,
}

impl GlueSource {
    /// Wrap text that belongs at `path`
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read the glue file at `path`
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SlimError> {
        Self::load_with_fs(path, &RealFileSystem)
    }

    /// Read the glue file at `path` through a custom filesystem
    pub fn load_with_fs<FS: FileSystem>(
        path: impl Into<PathBuf>,
        fs: &FS,
    ) -> Result<Self, SlimError> {
        let path = path.into();
        let text = fs
            .read_to_string(&path)
            .map_err(|e| SlimError::io(format!("reading {}", path.display()), e))?;
        Ok(Self { path, text })
    }

    /// Location of the file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file, used to resolve relative imports
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Current text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Size of the current text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the current text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the in-memory text
    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Write the current text back over the file
    ///
    /// The text goes to a temporary file in the same directory which is then
    /// renamed over the original, so readers never observe a partial write.
    /// An existing file keeps its permissions.
    pub fn save(&self) -> Result<(), SlimError> {
        let context = || format!("writing {}", self.path.display());

        let mut staged =
            NamedTempFile::new_in(self.dir()).map_err(|e| SlimError::io(context(), e))?;
        match std::fs::metadata(&self.path) {
            Ok(existing) => staged
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| SlimError::io(context(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SlimError::io(context(), e)),
        }
        staged
            .write_all(self.text.as_bytes())
            .map_err(|e| SlimError::io(context(), e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| SlimError::io(context(), e))?;
        staged
            .persist(&self.path)
            .map_err(|e| SlimError::io(context(), e.error))?;

        log::debug!("saved {} ({} bytes)", self.path.display(), self.text.len());
        Ok(())
    }
}
