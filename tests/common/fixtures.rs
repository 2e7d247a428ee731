//! Test fixture helpers for creating glue projects
//!
//! Provides a temporary directory laid out the way the generator leaves it:
//! `lib/lz4.js` with an inline payload next to `lib/lz4.internal.js`.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wasm_inline_slim::glue::{encode_wrapped, END_MARKER, START_MARKER};

/// Internal module with two public and one private export
pub const INTERNAL_MODULE: &str = "\
export function compress(input) {
  return input;
}
export const _wasm_ptr = 0;
export class Lz4Stream {}
";

/// wasm-opt stand-in that keeps the first 8 bytes of its input
pub const TRUNCATING_WASM_OPT: &str = r#"#!/bin/sh
prev=""
input=""
output=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then
    output="$arg"
  else
    case "$arg" in
      -*) ;;
      *) input="$arg" ;;
    esac
  fi
  prev="$arg"
done
echo "$@" > "$(dirname "$0")/last-args"
head -c 8 "$input" > "$output"
"#;

/// wasm-opt stand-in that always fails with exit code 2
pub const FAILING_WASM_OPT: &str = "#!/bin/sh\necho 'wasm-opt: validation failed' >&2\nexit 2\n";

/// Glue text re-exporting the internal module and embedding `payload`
pub fn glue_text(payload: &[u8]) -> String {
    format!(
        "import {{ base64decode }} from \"./util.js\";\nexport * from \"./lz4.internal.js\";\n\n{START_MARKER}{}{END_MARKER}export const wasm = bytes;\n",
        encode_wrapped(payload)
    )
}

/// Expected glue text after a run with [`TRUNCATING_WASM_OPT`]
pub fn optimized_glue_text(payload: &[u8]) -> String {
    format!(
        "import {{ base64decode }} from \"./util.js\";\nexport {{\n  compress,\n  Lz4Stream,\n}} from \"./lz4.internal.js\";\n\n{START_MARKER}{}{END_MARKER}export const wasm = bytes;\n",
        encode_wrapped(&payload[..8.min(payload.len())])
    )
}

/// Temporary project holding generated glue
pub struct GlueProject {
    dir: TempDir,
}

impl GlueProject {
    /// Project whose glue embeds `payload`
    pub fn new(payload: &[u8]) -> Self {
        let project = Self::empty();
        project.write_glue(&glue_text(payload));
        project
    }

    /// Project with the internal module but no glue file yet
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("lib")).expect("Failed to create lib dir");
        fs::write(dir.path().join("lib/lz4.internal.js"), INTERNAL_MODULE)
            .expect("Failed to write internal module");
        Self { dir }
    }

    /// Project root
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `lib/lz4.js`
    pub fn glue_path(&self) -> PathBuf {
        self.root().join("lib/lz4.js")
    }

    /// Overwrite the glue file
    pub fn write_glue(&self, text: &str) {
        fs::write(self.glue_path(), text).expect("Failed to write glue");
    }

    /// Current glue file text
    pub fn read_glue(&self) -> String {
        fs::read_to_string(self.glue_path()).expect("Failed to read glue")
    }

    /// Tool cache base used by this project
    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache")
    }

    /// Where the acquirer expects the optimizer
    pub fn wasm_opt_path(&self) -> PathBuf {
        self.cache_dir()
            .join("wasm-inline-slim/version_121/binaryen-version_121/bin/wasm-opt")
    }

    /// Arguments of the last fake optimizer run
    pub fn last_wasm_opt_args(&self) -> String {
        fs::read_to_string(self.wasm_opt_path().with_file_name("last-args"))
            .expect("wasm-opt was not run")
    }

    /// Write `.wasm-inline-slim.toml` pointing the cache into the project
    pub fn write_config(&self, extra: &str) {
        fs::write(
            self.root().join(".wasm-inline-slim.toml"),
            format!(
                "[cache]\ndir = \"{}\"\n\n{}",
                self.cache_dir().display(),
                extra
            ),
        )
        .expect("Failed to write config");
    }

    /// Put an executable script where the cached wasm-opt belongs
    #[cfg(unix)]
    pub fn install_fake_wasm_opt(&self, script: &str) {
        write_script(&self.wasm_opt_path(), script);
    }
}

/// Write an executable shell script, creating parent directories
#[cfg(unix)]
pub fn write_script(path: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create script dir");
    }
    fs::write(path, script).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
}
