//! Comparison results — matches between two submissions

pub mod metrics;

pub use metrics::SimilarityMetric;

use serde::{Deserialize, Serialize};

// ─── Match ──────────────────────────────────────────────────────────

/// A maximal run of identical token values between two submissions.
///
/// `start_in_first`/`start_in_second` are token indices into the
/// respective sequences; `length` is the number of matched tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub start_in_first: usize,
    pub start_in_second: usize,
    pub length: usize,
}

impl Match {
    pub fn new(start_in_first: usize, start_in_second: usize, length: usize) -> Self {
        Self {
            start_in_first,
            start_in_second,
            length,
        }
    }

    /// One-past-the-end index on the first side.
    pub fn end_in_first(&self) -> usize {
        self.start_in_first + self.length
    }

    /// One-past-the-end index on the second side.
    pub fn end_in_second(&self) -> usize {
        self.start_in_second + self.length
    }

    /// Two matches overlap iff their index ranges intersect on either
    /// side.
    pub fn overlaps(&self, other: &Match) -> bool {
        fn intersects(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
            a_start < b_end && b_start < a_end
        }
        intersects(
            self.start_in_first,
            self.end_in_first(),
            other.start_in_first,
            other.end_in_first(),
        ) || intersects(
            self.start_in_second,
            self.end_in_second(),
            other.start_in_second,
            other.end_in_second(),
        )
    }
}

// ─── Comparison ─────────────────────────────────────────────────────

/// The outcome of comparing two submissions.
///
/// `first` is, by convention, the submission with the smaller token
/// count (ties broken by name). `matches` are the accepted tilings
/// (length ≥ minimum token match); `ignored_matches` fell below that
/// threshold but reached the merge window and are kept as bridge
/// candidates for the merging post-pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub first_name: String,
    pub second_name: String,
    /// Comparable token count of the first submission (sentinel
    /// excluded); the divisor of the similarity metrics.
    pub first_token_count: usize,
    /// Comparable token count of the second submission.
    pub second_token_count: usize,
    pub matches: Vec<Match>,
    pub ignored_matches: Vec<Match>,
}

impl Comparison {
    pub fn empty(
        first_name: impl Into<String>,
        second_name: impl Into<String>,
        first_token_count: usize,
        second_token_count: usize,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            second_name: second_name.into(),
            first_token_count,
            second_token_count,
            matches: Vec::new(),
            ignored_matches: Vec::new(),
        }
    }

    /// Total number of matched tokens across all accepted matches.
    pub fn number_of_matched_tokens(&self) -> usize {
        self.matches.iter().map(|m| m.length).sum()
    }

    /// Length of the longest accepted match, 0 if there is none.
    pub fn longest_match(&self) -> usize {
        self.matches.iter().map(|m| m.length).max().unwrap_or(0)
    }

    /// Average similarity (matched tokens over the mean sequence
    /// length), the default reporting metric.
    pub fn similarity(&self) -> f64 {
        SimilarityMetric::Avg.score(self)
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <-> {}: {:.1}%",
            self.first_name,
            self.second_name,
            self.similarity() * 100.0
        )
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
