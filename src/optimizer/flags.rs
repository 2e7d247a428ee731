//! wasm-opt flag policy

/// Level used when the caller passes no optimization flag
pub const DEFAULT_FALLBACK_LEVEL: &str = "-Os";

/// Feature flags that are always passed
pub const REQUIRED_FEATURE_FLAGS: &[&str] = &["--enable-bulk-memory-opt", "--all-features"];

/// Whether `flag` selects an optimization level
pub fn is_opt_level_flag(flag: &str) -> bool {
    flag.starts_with("-O") || flag.starts_with("--opt")
}

/// Apply the flag policy to caller-supplied flags
///
/// - `-Os` is prepended when no flag selects an optimization level
/// - each required feature flag is appended unless already present
///
/// # Examples
///
/// ```
/// use wasm_inline_slim::optimizer::normalize_flags;
///
/// let flags = normalize_flags(&["--strip-debug".to_string()]);
/// assert_eq!(
///     flags,
///     ["-Os", "--strip-debug", "--enable-bulk-memory-opt", "--all-features"]
/// );
/// ```
pub fn normalize_flags(flags: &[String]) -> Vec<String> {
    let mut normalized = Vec::with_capacity(flags.len() + 3);

    if !flags.iter().any(|f| is_opt_level_flag(f)) {
        normalized.push(DEFAULT_FALLBACK_LEVEL.to_string());
    }
    normalized.extend(flags.iter().cloned());

    for required in REQUIRED_FEATURE_FLAGS {
        if !normalized.iter().any(|f| f == required) {
            normalized.push((*required).to_string());
        }
    }

    normalized
}
