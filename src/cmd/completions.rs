//! Completions command implementation
//!
//! Handles the `wasm-inline-slim completions` command which generates
//! shell completion scripts for bash, zsh, fish, etc.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io::Write;

/// Generate a shell completion script for `cmd`
///
/// Users can redirect the output to their shell's completion directory.
///
/// # Examples
///
/// ```bash
/// # Bash
/// wasm-inline-slim completions bash > /etc/bash_completion.d/wasm-inline-slim
///
/// # Zsh
/// wasm-inline-slim completions zsh > ~/.zfunc/_wasm-inline-slim
///
/// # Fish
/// wasm-inline-slim completions fish > ~/.config/fish/completions/wasm-inline-slim.fish
/// ```
pub fn cmd_completions(shell: Shell, cmd: &mut Command, out: &mut dyn Write) {
    let bin_name = cmd.get_name().to_string();
    generate(shell, cmd, bin_name, out);
}
