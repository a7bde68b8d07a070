//! Similarity metrics over comparisons
//!
//! Every metric reduces a [`Comparison`] to a single score. Most are
//! ratios of matched tokens to sequence lengths and live in [0, 1]; the
//! counting metrics (INTERSECTION, LONGEST_MATCH, OVERALL) are absolute
//! token counts used for ranking rather than thresholding.

use super::Comparison;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimilarityMetric {
    /// Matched tokens over the mean of both lengths (default).
    Avg,
    /// Matched tokens over the shorter length.
    Min,
    /// Matched tokens over the longer length.
    Max,
    /// `2·M / (|L|+|R|)`, 0 when both sides are empty.
    Symmetric,
    /// Absolute number of matched tokens.
    Intersection,
    /// Number of tokens in the longest match.
    LongestMatch,
    /// Sum of both sequence lengths.
    Overall,
}

impl SimilarityMetric {
    pub const ALL: [SimilarityMetric; 7] = [
        SimilarityMetric::Avg,
        SimilarityMetric::Min,
        SimilarityMetric::Max,
        SimilarityMetric::Symmetric,
        SimilarityMetric::Intersection,
        SimilarityMetric::LongestMatch,
        SimilarityMetric::Overall,
    ];

    /// Canonical metric name, as used in report dictionaries.
    pub fn name(&self) -> &'static str {
        match self {
            SimilarityMetric::Avg => "AVG",
            SimilarityMetric::Min => "MIN",
            SimilarityMetric::Max => "MAX",
            SimilarityMetric::Symmetric => "SYMMETRIC",
            SimilarityMetric::Intersection => "INTERSECTION",
            SimilarityMetric::LongestMatch => "LONGEST_MATCH",
            SimilarityMetric::Overall => "OVERALL",
        }
    }

    /// Apply this metric to a comparison.
    pub fn score(&self, comparison: &Comparison) -> f64 {
        let matched = comparison.number_of_matched_tokens() as f64;
        let first = comparison.first_token_count as f64;
        let second = comparison.second_token_count as f64;

        match self {
            SimilarityMetric::Avg => ratio(matched, (first + second) / 2.0),
            SimilarityMetric::Min => ratio(matched, first.min(second)),
            SimilarityMetric::Max => ratio(matched, first.max(second)),
            SimilarityMetric::Symmetric => ratio(2.0 * matched, first + second),
            SimilarityMetric::Intersection => matched,
            SimilarityMetric::LongestMatch => comparison.longest_match() as f64,
            SimilarityMetric::Overall => first + second,
        }
    }

    /// Whether the comparison clears the given threshold under this
    /// metric.
    pub fn is_above_threshold(&self, comparison: &Comparison, threshold: f64) -> bool {
        self.score(comparison) >= threshold
    }

    /// The full metric-name → value dictionary for reports.
    pub fn similarity_map(comparison: &Comparison) -> BTreeMap<String, f64> {
        Self::ALL
            .iter()
            .map(|metric| (metric.name().to_string(), metric.score(comparison)))
            .collect()
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn ratio(numerator: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        0.0
    } else {
        numerator / divisor
    }
}
