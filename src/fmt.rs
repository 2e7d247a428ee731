//! Shared formatting utilities for size display and console output

use console::Emoji;

/// Checkmark for success lines
pub const CHECKMARK: Emoji = Emoji("✔️", "[OK]");

/// Crossmark for failure lines
pub const CROSSMARK: Emoji = Emoji("✖️", "[FAIL]");

/// Arrow between before/after sizes
pub const ARROW: Emoji = Emoji("⇒", "->");

/// Emoji text, or its plain fallback when `NO_EMOJI` is set or stderr
/// cannot show emoji
pub fn glyph(emoji: &Emoji<'static, 'static>) -> &'static str {
    if std::env::var_os("NO_EMOJI").is_some() || !console::Term::stderr().features().wants_emoji()
    {
        emoji.1
    } else {
        emoji.0
    }
}

/// Format bytes as a human-readable SI size string
///
/// Uses powers of 1000 and at most two fraction digits, dropping trailing zeros.
/// The integer part is grouped by thousands.
///
/// # Examples
///
/// ```
/// use wasm_inline_slim::fmt::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1000), "1 KB");
/// assert_eq!(format_bytes(1536), "1.54 KB");
/// assert_eq!(format_bytes(2_500_000), "2.5 MB");
/// assert_eq!(format_bytes(999_999), "1,000 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1000.0 && unit < UNITS.len() - 1 {
        size /= 1000.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", size);
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut number = group_thousands(whole);
    if !fraction.is_empty() {
        number.push('.');
        number.push_str(fraction);
    }
    format!("{} {}", number, UNITS[unit])
}

/// Insert `,` between groups of three digits
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Format a percentage with two decimals, as shown in savings reports
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes_various_sizes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1000), "1 KB");
        assert_eq!(format_bytes(1234), "1.23 KB");
        assert_eq!(format_bytes(1_048_576), "1.05 MB");
        assert_eq!(format_bytes(3_000_000_000), "3 GB");
    }

    #[test]
    fn test_format_bytes_caps_at_petabytes() {
        assert_eq!(format_bytes(5_000_000_000_000_000_000), "5,000 PB");
    }

    #[test]
    fn test_format_bytes_groups_rounded_thousands() {
        assert_eq!(format_bytes(999_999), "1,000 KB");
        assert_eq!(format_bytes(1_234_567_000_000_000_000), "1,234.57 PB");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_format_percent_two_decimals() {
        assert_eq!(format_percent(12.3456), "12.35%");
        assert_eq!(format_percent(-3.0), "-3.00%");
    }
}
