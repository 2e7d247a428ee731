//! Acquisition of the `wasm-opt` optimizer
//!
//! Binaryen publishes prebuilt archives per release tag, OS and architecture.
//! The executable is cached at
//! `<cache>/<namespace>/<version>/binaryen-<version>/bin/wasm-opt` and its
//! presence at that path is the only "already installed" signal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use crate::archive::ArchiveExtractor;
use crate::error::{BoxedSource, SlimError};
use crate::fetch::{HttpClient, RetryingFetcher, Sleeper, ThreadSleeper};
use crate::infra::Environment;
use crate::platform::{cache_dir, Platform};

/// Binaryen release used when none is configured
pub const DEFAULT_BINARYEN_VERSION: &str = "version_121";

/// Cache namespace used when none is configured
pub const DEFAULT_CACHE_NAMESPACE: &str = "wasm-inline-slim";

const BINARYEN_RELEASES: &str = "https://github.com/WebAssembly/binaryen/releases/download";

/// A versioned Binaryen release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRelease {
    /// Release tag, e.g. `version_121`
    pub version: String,
}

impl ToolRelease {
    /// Release for the given tag
    pub fn binaryen(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Top-level directory inside the release archive
    pub fn archive_top_dir(&self) -> String {
        format!("binaryen-{}", self.version)
    }

    /// Download URL of the archive for `platform`
    ///
    /// # Examples
    ///
    /// ```
    /// use wasm_inline_slim::platform::{HostArch, HostOs, Platform};
    /// use wasm_inline_slim::tools::ToolRelease;
    ///
    /// let release = ToolRelease::binaryen("version_121");
    /// let url = release
    ///     .download_url(&Platform::new(HostOs::MacOs, HostArch::Aarch64))
    ///     .unwrap();
    /// assert!(url.ends_with("/version_121/binaryen-version_121-arm64-macos.tar.gz"));
    /// ```
    pub fn download_url(&self, platform: &Platform) -> Result<String, SlimError> {
        Ok(format!(
            "{}/{}/{}-{}.tar.gz",
            BINARYEN_RELEASES,
            self.version,
            self.archive_top_dir(),
            platform.release_suffix()?
        ))
    }
}

impl Default for ToolRelease {
    fn default() -> Self {
        Self::binaryen(DEFAULT_BINARYEN_VERSION)
    }
}

/// Ensures the optimizer executable exists in the local cache
pub struct ToolAcquirer<C: HttpClient, S: Sleeper = ThreadSleeper> {
    release: ToolRelease,
    platform: Platform,
    namespace_dir: PathBuf,
    fetcher: RetryingFetcher<C, S>,
}

impl<C: HttpClient, S: Sleeper> ToolAcquirer<C, S> {
    /// Create an acquirer caching under `cache_base/namespace`
    pub fn new(
        release: ToolRelease,
        platform: Platform,
        cache_base: &Path,
        namespace: &str,
        fetcher: RetryingFetcher<C, S>,
    ) -> Self {
        Self {
            release,
            platform,
            namespace_dir: cache_base.join(namespace),
            fetcher,
        }
    }

    /// Create an acquirer whose cache base comes from `override_dir` or the
    /// platform cache directory found in `env`
    ///
    /// # Errors
    /// [`SlimError::NoCacheDirectory`] when neither is available.
    pub fn locate(
        release: ToolRelease,
        platform: Platform,
        env: &impl Environment,
        override_dir: Option<&Path>,
        namespace: &str,
        fetcher: RetryingFetcher<C, S>,
    ) -> Result<Self, SlimError> {
        let base = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => cache_dir(&platform.os, env)?,
        };
        Ok(Self::new(release, platform, &base, namespace, fetcher))
    }

    /// Name of the executable on the target platform
    pub fn executable_name(&self) -> String {
        self.platform.os.executable_name("wasm-opt")
    }

    /// Directory holding one extracted release
    pub fn version_dir(&self) -> PathBuf {
        self.namespace_dir.join(&self.release.version)
    }

    /// Expected location of the executable
    pub fn binary_path(&self) -> PathBuf {
        self.version_dir()
            .join(self.release.archive_top_dir())
            .join("bin")
            .join(self.executable_name())
    }

    /// Return the cached executable, downloading it on a cache miss
    ///
    /// # Errors
    /// - [`SlimError::UnsupportedPlatform`] when no release exists for the host
    /// - [`SlimError::AcquisitionFailed`] when the download or extraction
    ///   fails, or the archive did not contain the executable
    pub fn ensure_binary(&self) -> Result<PathBuf, SlimError> {
        let binary = self.binary_path();
        if binary.exists() {
            log::debug!("wasm-opt cache hit: {}", binary.display());
            return Ok(binary);
        }

        let url = self.release.download_url(&self.platform)?;
        log::debug!("wasm-opt cache miss, downloading {}", url);
        eprintln!("{} wasm-opt binary...", style("Downloading").green().bold());

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(url.clone());
        spinner.enable_steady_tick(Duration::from_millis(100));
        let staged = self.download(&url, &spinner);
        spinner.finish_and_clear();

        self.install(staged?)?;

        if !binary.exists() {
            return Err(acquisition_failed(
                format!(
                    "the executable did not exist after downloading at {}",
                    binary.display()
                ),
                None,
            ));
        }
        Ok(binary)
    }

    /// Fetch and unpack the release into a fresh staging directory
    fn download(&self, url: &str, progress: &ProgressBar) -> Result<PathBuf, SlimError> {
        let response = self
            .fetcher
            .fetch_with_progress(url, progress)
            .map_err(|e| acquisition_failed("download failed", Some(Box::new(e))))?;

        let staging = self
            .namespace_dir
            .join(format!(".staging-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&staging)
            .map_err(|e| acquisition_failed("cannot create cache directory", Some(Box::new(e))))?;

        let extractor = ArchiveExtractor::new(self.executable_name());
        if let Err(e) = extractor.extract(response.body, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(acquisition_failed("cannot unpack archive", Some(Box::new(e))));
        }
        Ok(staging)
    }

    /// Move a staged extraction into place as the version directory
    ///
    /// Another process may have installed the same release meanwhile; its copy
    /// wins and the staged one is discarded.
    fn install(&self, staging: PathBuf) -> Result<(), SlimError> {
        let version_dir = self.version_dir();

        if self.binary_path().exists() {
            log::debug!("release installed concurrently, discarding {}", staging.display());
            let _ = fs::remove_dir_all(&staging);
            return Ok(());
        }

        if version_dir.exists() {
            log::warn!(
                "removing incomplete release directory {}",
                version_dir.display()
            );
            fs::remove_dir_all(&version_dir).map_err(|e| {
                acquisition_failed("cannot replace incomplete release", Some(Box::new(e)))
            })?;
        }

        let renamed = fs::rename(&staging, &version_dir);
        self.settle_rename(&staging, renamed)
    }

    /// Accept a failed rename when another process finished the install
    fn settle_rename(&self, staging: &Path, renamed: io::Result<()>) -> Result<(), SlimError> {
        let e = match renamed {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        let _ = fs::remove_dir_all(staging);

        if self.binary_path().exists() {
            log::debug!("release installed concurrently, discarded {}", staging.display());
            return Ok(());
        }
        Err(acquisition_failed(
            "cannot move release into the cache",
            Some(Box::new(e)),
        ))
    }
}

fn acquisition_failed(reason: impl Into<String>, source: Option<BoxedSource>) -> SlimError {
    SlimError::AcquisitionFailed {
        tool: "wasm-opt".to_string(),
        reason: reason.into(),
        source,
    }
}
