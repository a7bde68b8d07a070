//! Engine — run configuration and the comparison driver
//!
//! The engine wires the pieces together: it resolves the effective
//! minimum token match from the configuration and the front-end,
//! normalizes submissions when the front-end supports it, subtracts
//! base code, and fans the all-pairs comparison out over a rayon
//! worker pool.

pub mod driver;

pub use driver::{RunResult, TesseraEngine};

use crate::comparison::SimilarityMetric;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ─── Configuration ─────────────────────────────────────────────────

/// Run configuration. Out-of-range values are normalized (with a
/// warning) rather than rejected, so a sloppy caller still gets a
/// well-defined run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TesseraConfig {
    /// Minimum token match; `None` falls back to the front-end default.
    pub minimum_token_match: Option<usize>,
    /// Slack below the minimum token match during the inner search;
    /// also the maximum per-hop gap of the merging post-pass. 0
    /// disables merging.
    pub merge_buffer: usize,
    /// Maximum total span bridged between two matches when merging.
    /// 0 means unlimited.
    pub merge_length: usize,
    /// Metric used for threshold filtering and result ranking.
    pub similarity_metric: SimilarityMetric,
    /// Comparisons scoring below this value are dropped. Clamped into
    /// [0, 1].
    pub similarity_threshold: f64,
    /// Upper bound on retained comparisons, keeping the top-scoring
    /// ones. 0 keeps all.
    pub maximum_number_of_comparisons: usize,
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            minimum_token_match: None,
            merge_buffer: 0,
            merge_length: 0,
            similarity_metric: SimilarityMetric::Avg,
            similarity_threshold: 0.0,
            maximum_number_of_comparisons: 100,
        }
    }
}

impl TesseraConfig {
    /// Clamp out-of-range values into their documented domains.
    pub fn normalized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            let clamped = self.similarity_threshold.clamp(0.0, 1.0);
            tracing::warn!(
                "Similarity threshold {} out of range, clamping to {}",
                self.similarity_threshold,
                clamped,
            );
            self.similarity_threshold = if clamped.is_nan() { 0.0 } else { clamped };
        }
        if self.minimum_token_match == Some(0) {
            tracing::warn!("Minimum token match must be at least 1, using 1");
            self.minimum_token_match = Some(1);
        }
        self
    }
}

// ─── Cancellation ──────────────────────────────────────────────────

/// Shared flag to abort a running comparison at pair granularity.
///
/// Clones observe the same flag. Pairs that already completed stay in
/// the partial result; pairs not yet started are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_clamped() {
        let config = TesseraConfig {
            similarity_threshold: 1.7,
            ..TesseraConfig::default()
        }
        .normalized();
        assert_eq!(config.similarity_threshold, 1.0);

        let negative = TesseraConfig {
            similarity_threshold: -0.3,
            ..TesseraConfig::default()
        }
        .normalized();
        assert_eq!(negative.similarity_threshold, 0.0);
    }

    #[test]
    fn test_in_range_threshold_is_untouched() {
        let config = TesseraConfig {
            similarity_threshold: 0.42,
            ..TesseraConfig::default()
        }
        .normalized();
        assert_eq!(config.similarity_threshold, 0.42);
    }

    #[test]
    fn test_zero_minimum_token_match_is_floored() {
        let config = TesseraConfig {
            minimum_token_match: Some(0),
            ..TesseraConfig::default()
        }
        .normalized();
        assert_eq!(config.minimum_token_match, Some(1));
    }

    #[test]
    fn test_cancellation_flag_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}
