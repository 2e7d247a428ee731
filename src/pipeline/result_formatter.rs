//! Operator-facing result lines
//!
//! All of these go to stderr; stdout is kept for machine-readable output.

use std::path::Path;

use console::style;

use super::metrics::SizeMetrics;
use crate::fmt::{format_bytes, format_percent, glyph, ARROW, CHECKMARK};

/// Formats and displays pipeline results
pub struct ResultFormatter;

impl ResultFormatter {
    /// Savings line printed after the payload patch
    pub fn optimized_line(metrics: &SizeMetrics) -> String {
        format!(
            " {} inline WebAssembly from {} {} {}. You saved {}!",
            style(format!("{} Optimized", glyph(&CHECKMARK))).green().bold(),
            style(format_bytes(metrics.before_bytes)).red(),
            glyph(&ARROW),
            style(format_bytes(metrics.after_bytes))
                .green()
                .bold()
                .underlined(),
            style(format_percent(metrics.reduction_percent()))
                .yellow()
                .bold(),
        )
    }

    /// Final line of a successful build
    pub fn success_line(glue_file: &Path) -> String {
        format!(
            " {}: Built and optimized the WASM module at {}",
            style(format!("{} Success", glyph(&CHECKMARK))).green().bold(),
            style(glue_file.display()).green().bold().underlined(),
        )
    }

    /// Print the savings line surrounded by blank lines
    pub fn print_optimized(metrics: &SizeMetrics) {
        eprintln!("\n{}\n", Self::optimized_line(metrics));
    }

    /// Print the final success line
    pub fn print_success(glue_file: &Path) {
        eprintln!("{}", Self::success_line(glue_file));
    }
}
