//! Streaming extraction of `.tar.gz` release archives
//!
//! Entries are decompressed and visited one at a time; nothing but the
//! selected files is written to disk.

use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

/// Shared library extensions that travel with the optimizer executable
pub const SHARED_LIBRARY_EXTENSIONS: &[&str] = &[".dylib"];

/// Selects archive entries by file-name suffix
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    executable_name: String,
}

impl ArchiveExtractor {
    /// Create an extractor for the executable called `executable_name`
    pub fn new(executable_name: impl Into<String>) -> Self {
        Self {
            executable_name: executable_name.into(),
        }
    }

    /// Whether an entry path names the executable
    pub fn is_executable(&self, entry_path: &str) -> bool {
        entry_path.ends_with(&self.executable_name)
    }

    /// Whether an entry should be written to disk
    pub fn is_wanted(&self, entry_path: &str) -> bool {
        self.is_executable(entry_path)
            || SHARED_LIBRARY_EXTENSIONS
                .iter()
                .any(|ext| entry_path.ends_with(ext))
    }

    /// Decompress `reader` and write every wanted entry under `destination`
    ///
    /// Entries keep their archive-relative path. The executable is made
    /// executable (0o755) on Unix. Absolute entries and entries with `..`
    /// components are skipped.
    ///
    /// # Returns
    /// Paths of the files written, in archive order.
    pub fn extract<R: Read>(&self, reader: R, destination: &Path) -> io::Result<Vec<PathBuf>> {
        let mut archive = Archive::new(GzDecoder::new(reader));
        let mut written = Vec::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = entry.path()?.to_string_lossy().into_owned();
            if !self.is_wanted(&entry_path) {
                // Unread entry data is skipped when the iterator advances.
                continue;
            }

            let relative = match contained_path(&entry.path()?) {
                Some(relative) => relative,
                None => {
                    log::warn!("skipping archive entry outside destination: {}", entry_path);
                    continue;
                }
            };
            if !entry.unpack_in(destination)? {
                log::warn!("skipping archive entry outside destination: {}", entry_path);
                continue;
            }

            let target = destination.join(relative);
            if self.is_executable(&entry_path) {
                make_executable(&target)?;
            }
            log::debug!("extracted {}", target.display());
            written.push(target);
        }

        Ok(written)
    }
}

/// The entry path as plain relative components, or `None` if it could
/// leave the destination
fn contained_path(entry_path: &Path) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in entry_path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) | Component::ParentDir => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Build an in-memory `.tar.gz` from `(path, contents)` pairs
#[cfg(test)]
pub(crate) fn build_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *contents).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_predicate_matches_executable_and_dylib() {
        let extractor = ArchiveExtractor::new("wasm-opt");

        assert!(extractor.is_wanted("binaryen-version_121/bin/wasm-opt"));
        assert!(extractor.is_wanted("binaryen-version_121/lib/libbinaryen.dylib"));
        assert!(!extractor.is_wanted("binaryen-version_121/bin/wasm-dis"));
        assert!(!extractor.is_wanted("binaryen-version_121/include/binaryen-c.h"));
    }

    #[test]
    fn test_extracts_only_wanted_entries() {
        let archive = build_tar_gz(&[
            ("binaryen-version_121/bin/wasm-as", b"as"),
            ("binaryen-version_121/bin/wasm-opt", b"opt-binary"),
            ("binaryen-version_121/include/binaryen-c.h", b"header"),
            ("binaryen-version_121/lib/libbinaryen.dylib", b"dylib"),
        ]);
        let dest = TempDir::new().unwrap();

        let written = ArchiveExtractor::new("wasm-opt")
            .extract(Cursor::new(archive), dest.path())
            .unwrap();

        assert_eq!(written.len(), 2);
        let exe = dest.path().join("binaryen-version_121/bin/wasm-opt");
        assert_eq!(std::fs::read(&exe).unwrap(), b"opt-binary");
        assert!(dest
            .path()
            .join("binaryen-version_121/lib/libbinaryen.dylib")
            .exists());
        assert!(!dest.path().join("binaryen-version_121/bin/wasm-as").exists());
        assert!(!dest.path().join("binaryen-version_121/include").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_gets_exec_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let archive = build_tar_gz(&[("pkg/bin/wasm-opt", b"#!/bin/sh\n")]);
        let dest = TempDir::new().unwrap();
        ArchiveExtractor::new("wasm-opt")
            .extract(Cursor::new(archive), dest.path())
            .unwrap();

        let mode = std::fs::metadata(dest.path().join("pkg/bin/wasm-opt"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_rerun_over_populated_destination_is_idempotent() {
        let archive = build_tar_gz(&[("pkg/bin/wasm-opt", b"v1")]);
        let dest = TempDir::new().unwrap();
        let extractor = ArchiveExtractor::new("wasm-opt");

        extractor
            .extract(Cursor::new(archive.clone()), dest.path())
            .unwrap();
        extractor.extract(Cursor::new(archive), dest.path()).unwrap();

        assert_eq!(
            std::fs::read(dest.path().join("pkg/bin/wasm-opt")).unwrap(),
            b"v1"
        );
    }

    /// Archive with one raw entry name, bypassing the builder's path checks
    fn tar_gz_with_raw_name(name: &str, contents: &[u8]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        builder.append(&header, contents).unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_absolute_entry_is_skipped() {
        let dest = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("bin").join("wasm-opt");
        let archive = tar_gz_with_raw_name(&target.to_string_lossy(), b"#!/bin/sh\n");

        let written = ArchiveExtractor::new("wasm-opt")
            .extract(Cursor::new(archive), dest.path())
            .unwrap();

        assert!(written.is_empty());
        assert!(!target.exists());
    }

    #[test]
    fn test_parent_dir_entry_is_skipped() {
        let root = TempDir::new().unwrap();
        let dest = root.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        let archive = tar_gz_with_raw_name("../escape/bin/wasm-opt", b"#!/bin/sh\n");

        let written = ArchiveExtractor::new("wasm-opt")
            .extract(Cursor::new(archive), &dest)
            .unwrap();

        assert!(written.is_empty());
        assert!(!root.path().join("escape").exists());
    }

    #[test]
    fn test_contained_path_normalizes_current_dir() {
        assert_eq!(
            contained_path(Path::new("./binaryen-version_121/bin/wasm-opt")),
            Some(PathBuf::from("binaryen-version_121/bin/wasm-opt"))
        );
        assert_eq!(contained_path(Path::new("/abs/wasm-opt")), None);
        assert_eq!(contained_path(Path::new("a/../wasm-opt")), None);
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let dest = TempDir::new().unwrap();
        let result =
            ArchiveExtractor::new("wasm-opt").extract(Cursor::new(b"not gzip".to_vec()), dest.path());
        assert!(result.is_err());
    }
}
