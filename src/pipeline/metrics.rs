//! Size metrics and the per-run report

use std::path::PathBuf;

use serde::Serialize;

/// Size metrics for before/after comparison
///
/// Tracks the size of the glue text through the payload patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMetrics {
    /// Size before optimization (bytes)
    pub before_bytes: u64,
    /// Size after optimization (bytes)
    pub after_bytes: u64,
}

impl SizeMetrics {
    /// Calculate size reduction in bytes
    pub fn reduction_bytes(&self) -> i64 {
        self.before_bytes as i64 - self.after_bytes as i64
    }

    /// Calculate size reduction as percentage
    pub fn reduction_percent(&self) -> f64 {
        if self.before_bytes == 0 {
            return 0.0;
        }
        (self.reduction_bytes() as f64 / self.before_bytes as f64) * 100.0
    }
}

/// Outcome of a successful run, serialized by `build --json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Glue file that was rewritten
    pub glue_file: PathBuf,
    /// Glue size before the run (bytes)
    pub original_size: u64,
    /// Glue size after the run (bytes)
    pub final_size: u64,
    /// `original_size - final_size`
    pub reduction_bytes: i64,
    /// Reduction relative to `original_size`
    pub reduction_percent: f64,
    /// Wildcard re-exports replaced with named lists
    pub exports_rewritten: usize,
}

impl PipelineReport {
    /// Build a report from the patch metrics
    pub fn new(glue_file: PathBuf, metrics: SizeMetrics, exports_rewritten: usize) -> Self {
        Self {
            glue_file,
            original_size: metrics.before_bytes,
            final_size: metrics.after_bytes,
            reduction_bytes: metrics.reduction_bytes(),
            reduction_percent: metrics.reduction_percent(),
            exports_rewritten,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_metrics_calculates_reduction_correctly() {
        let metrics = SizeMetrics {
            before_bytes: 1_000_000,
            after_bytes: 500_000,
        };

        assert_eq!(metrics.reduction_bytes(), 500_000);
        assert_eq!(metrics.reduction_percent(), 50.0);
    }

    #[test]
    fn test_size_metrics_with_zero_before_size_handles_division_by_zero() {
        let metrics = SizeMetrics {
            before_bytes: 0,
            after_bytes: 100,
        };

        assert_eq!(metrics.reduction_bytes(), -100);
        assert_eq!(metrics.reduction_percent(), 0.0);
    }

    #[test]
    fn test_size_metrics_with_size_increase_returns_negative_reduction() {
        let metrics = SizeMetrics {
            before_bytes: 512,
            after_bytes: 1024,
        };

        assert_eq!(metrics.reduction_bytes(), -512);
        assert!(metrics.reduction_percent() < 0.0);
    }

    #[test]
    fn test_report_serializes_all_fields() {
        let report = PipelineReport::new(
            PathBuf::from("lib/lz4.js"),
            SizeMetrics {
                before_bytes: 1000,
                after_bytes: 750,
            },
            1,
        );

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["glue_file"], "lib/lz4.js");
        assert_eq!(json["original_size"], 1000);
        assert_eq!(json["final_size"], 750);
        assert_eq!(json["reduction_bytes"], 250);
        assert_eq!(json["reduction_percent"], 25.0);
        assert_eq!(json["exports_rewritten"], 1);
    }
}
