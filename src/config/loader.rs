//! Configuration file loading

use super::file::{ConfigFile, CONFIG_FILE_NAME};
use crate::infra::{FileSystem, RealFileSystem};
use anyhow::{Context, Result};
use std::path::Path;

/// Handles loading configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from .wasm-inline-slim.toml in the given directory
    ///
    /// A missing file yields the defaults.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wasm_inline_slim::config::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load(Path::new("."))?;
    /// println!("wasm-opt {}", config.wasm_opt.version);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(project_root: &Path) -> Result<ConfigFile> {
        Self::load_with_fs(project_root, &RealFileSystem)
    }

    /// Load config with a custom filesystem implementation
    pub fn load_with_fs<FS: FileSystem>(project_root: &Path, fs: &FS) -> Result<ConfigFile> {
        let config_path = project_root.join(CONFIG_FILE_NAME);

        let contents = match fs.read_to_string(&config_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ConfigFile::default());
            }
            Err(e) => {
                return Err(e).context(format!("Failed to read {}", CONFIG_FILE_NAME));
            }
        };

        Self::parse(&contents).with_context(|| format!("Invalid {}", config_path.display()))
    }

    /// Load an explicitly named config file, which must exist
    pub fn load_file(path: &Path) -> Result<ConfigFile> {
        Self::load_file_with_fs(path, &RealFileSystem)
    }

    /// Load an explicitly named config file with a custom filesystem
    pub fn load_file_with_fs<FS: FileSystem>(path: &Path, fs: &FS) -> Result<ConfigFile> {
        let contents = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid {}", path.display()))
    }

    /// Parse and validate config text
    pub fn parse(contents: &str) -> Result<ConfigFile> {
        let config: ConfigFile =
            toml_edit::de::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    // Mock FileSystem for testing
    struct MockFileSystem {
        file_content: Option<String>,
        should_fail_read: bool,
    }

    impl MockFileSystem {
        fn new() -> Self {
            Self {
                file_content: None,
                should_fail_read: false,
            }
        }

        fn with_content(content: &str) -> Self {
            Self {
                file_content: Some(content.to_string()),
                should_fail_read: false,
            }
        }

        fn with_read_error() -> Self {
            Self {
                file_content: None,
                should_fail_read: true,
            }
        }
    }

    impl FileSystem for MockFileSystem {
        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            if self.should_fail_read {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
            self.file_content
                .clone()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))
        }
    }

    #[test]
    fn test_loader_loads_from_valid_toml() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"
[generator]
out-dir = "dist"
module = "codec"

[wasm-opt]
opt-level = "-O3"
flags = ["--strip-debug"]
max-retries = 2

[cache]
dir = "/tmp/tools"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load(temp.path()).unwrap();

        assert_eq!(config.generator.out_dir, PathBuf::from("dist"));
        assert_eq!(config.generator.module, "codec");
        assert_eq!(config.wasm_opt.opt_level, "-O3");
        assert_eq!(config.wasm_opt.flags, ["--strip-debug"]);
        assert_eq!(config.wasm_opt.max_retries, 2);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/tools")));
    }

    #[test]
    fn test_loader_missing_file_returns_default() {
        let config = ConfigLoader::load_with_fs(Path::new("."), &MockFileSystem::new()).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_loader_read_error_is_reported() {
        let result = ConfigLoader::load_with_fs(Path::new("."), &MockFileSystem::with_read_error());
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read .wasm-inline-slim.toml"));
    }

    #[test]
    fn test_loader_invalid_toml_is_reported() {
        let fs = MockFileSystem::with_content("[wasm-opt\nversion = ");
        assert!(ConfigLoader::load_with_fs(Path::new("."), &fs).is_err());
    }

    #[test]
    fn test_loader_wrong_type_is_reported() {
        let fs = MockFileSystem::with_content("[wasm-opt]\nmax-retries = \"five\"\n");
        assert!(ConfigLoader::load_with_fs(Path::new("."), &fs).is_err());
    }

    #[test]
    fn test_loader_validation_failure_is_reported() {
        let fs = MockFileSystem::with_content("[wasm-opt]\nopt-level = \"fast\"\n");
        let message = format!(
            "{:#}",
            ConfigLoader::load_with_fs(Path::new("."), &fs).unwrap_err()
        );
        assert!(message.contains("must start with -O"));
    }

    #[test]
    fn test_load_file_requires_existing_file() {
        assert!(ConfigLoader::load_file_with_fs(Path::new("custom.toml"), &MockFileSystem::new()).is_err());

        let fs = MockFileSystem::with_content("[cache]\nnamespace = \"shared\"\n");
        let config = ConfigLoader::load_file_with_fs(Path::new("custom.toml"), &fs).unwrap();
        assert_eq!(config.cache.namespace, "shared");
    }
}
