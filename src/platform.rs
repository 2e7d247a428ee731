//! Host platform identification and cache directory resolution
//!
//! The operating system, architecture and environment are explicit inputs so
//! cache layout and release naming can be checked for every platform from any
//! host.

use std::fmt;
use std::path::PathBuf;

use crate::error::SlimError;
use crate::infra::Environment;

/// Host operating system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    /// Linux and other XDG-style systems
    Linux,
    /// macOS
    MacOs,
    /// Windows
    Windows,
    /// Anything else, carrying the raw identifier
    Other(String),
}

impl HostOs {
    /// Parse a `std::env::consts::OS` style identifier
    pub fn from_id(id: &str) -> Self {
        match id {
            "linux" => Self::Linux,
            "macos" | "darwin" => Self::MacOs,
            "windows" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    /// Identifier used for this OS in release artifact names
    pub fn release_name(&self) -> Option<&'static str> {
        match self {
            Self::Linux => Some("linux"),
            Self::MacOs => Some("macos"),
            Self::Windows => Some("windows"),
            Self::Other(_) => None,
        }
    }

    /// Name of an executable on this OS
    pub fn executable_name(&self, stem: &str) -> String {
        match self {
            Self::Windows => format!("{}.exe", stem),
            _ => stem.to_string(),
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("linux"),
            Self::MacOs => f.write_str("macos"),
            Self::Windows => f.write_str("windows"),
            Self::Other(id) => f.write_str(id),
        }
    }
}

/// Host CPU architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostArch {
    /// x86_64 / amd64
    X86_64,
    /// aarch64 / arm64
    Aarch64,
    /// Anything else, carrying the raw identifier
    Other(String),
}

impl HostArch {
    /// Parse a `std::env::consts::ARCH` style identifier
    pub fn from_id(id: &str) -> Self {
        match id {
            "x86_64" | "amd64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Aarch64,
            other => Self::Other(other.to_string()),
        }
    }

    /// Identifier used for this architecture in release artifact names
    pub fn release_name(&self) -> Option<&'static str> {
        match self {
            Self::X86_64 => Some("x86_64"),
            Self::Aarch64 => Some("arm64"),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for HostArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => f.write_str("x86_64"),
            Self::Aarch64 => f.write_str("aarch64"),
            Self::Other(id) => f.write_str(id),
        }
    }
}

/// Operating system and architecture pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Operating system
    pub os: HostOs,
    /// CPU architecture
    pub arch: HostArch,
}

impl Platform {
    /// Create a platform from explicit parts
    pub fn new(os: HostOs, arch: HostArch) -> Self {
        Self { os, arch }
    }

    /// Platform this binary was compiled for
    pub fn current() -> Self {
        Self::new(
            HostOs::from_id(std::env::consts::OS),
            HostArch::from_id(std::env::consts::ARCH),
        )
    }

    /// Release artifact suffix `<arch>-<os>`
    ///
    /// # Errors
    /// [`SlimError::UnsupportedPlatform`] when either part has no published release.
    pub fn release_suffix(&self) -> Result<String, SlimError> {
        match (self.arch.release_name(), self.os.release_name()) {
            (Some(arch), Some(os)) => Ok(format!("{}-{}", arch, os)),
            _ => Err(SlimError::UnsupportedPlatform {
                os: self.os.to_string(),
                arch: self.arch.to_string(),
            }),
        }
    }
}

/// Resolve the per-user cache directory for `os`
///
/// - Linux: `$XDG_CACHE_HOME`, else `$HOME/.cache`
/// - macOS: `$HOME/Library/Caches`
/// - Windows: `%LOCALAPPDATA%`
///
/// Empty variables count as unset.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use std::path::PathBuf;
/// use wasm_inline_slim::platform::{cache_dir, HostOs};
///
/// let env = HashMap::from([("HOME".to_string(), "/home/dev".to_string())]);
/// let dir = cache_dir(&HostOs::Linux, &env).unwrap();
/// assert_eq!(dir, PathBuf::from("/home/dev").join(".cache"));
/// ```
pub fn cache_dir(os: &HostOs, env: &impl Environment) -> Result<PathBuf, SlimError> {
    let non_empty = |key: &str| env.var(key).filter(|v| !v.is_empty());

    let dir = match os {
        HostOs::Linux => non_empty("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".cache"))),
        HostOs::MacOs => {
            non_empty("HOME").map(|home| PathBuf::from(home).join("Library").join("Caches"))
        }
        HostOs::Windows => non_empty("LOCALAPPDATA").map(PathBuf::from),
        HostOs::Other(_) => None,
    };

    dir.ok_or_else(|| SlimError::NoCacheDirectory { os: os.to_string() })
}
