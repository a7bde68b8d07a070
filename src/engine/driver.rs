//! All-pairs comparison driver
//!
//! Owns the run sequence: normalization, base-code marking, pair
//! enumeration, parallel comparison, threshold filtering, and the
//! top-N cap. Individual pair failures never abort a run; run-wide
//! inputs (base code, configuration) do.

use super::{CancellationFlag, TesseraConfig};
use crate::comparison::Comparison;
use crate::language::Frontend;
use crate::matching::{merge_matches, MergingOptions, TilingMatcher};
use crate::submission::{Submission, SubmissionSet};
use crate::{TesseraError, TesseraResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Everything a finished (or cancelled) run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Retained comparisons; order is unspecified beyond the ranking
    /// applied by the top-N cap.
    pub comparisons: Vec<Comparison>,
    /// Per-submission comparison against the base code, keyed by
    /// submission name. Empty when no base code is configured.
    pub base_code_comparisons: BTreeMap<String, Comparison>,
    /// Whether the run was cancelled; if so, `comparisons` holds only
    /// the pairs that completed beforehand.
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// The comparison engine: a configured matcher plus the front-end
/// capabilities of the language under test.
pub struct TesseraEngine {
    config: TesseraConfig,
    frontend: Frontend,
    matcher: TilingMatcher,
    minimum_token_match: usize,
}

impl TesseraEngine {
    pub fn new(config: TesseraConfig, frontend: Frontend) -> Self {
        let config = config.normalized();
        let minimum_token_match = config
            .minimum_token_match
            .unwrap_or(frontend.minimum_token_match)
            .max(1);
        let matcher = TilingMatcher::new(minimum_token_match, config.merge_buffer);
        Self {
            config,
            frontend,
            matcher,
            minimum_token_match,
        }
    }

    /// The minimum token match in effect (caller override or front-end
    /// default).
    pub fn minimum_token_match(&self) -> usize {
        self.minimum_token_match
    }

    pub fn config(&self) -> &TesseraConfig {
        &self.config
    }

    pub fn frontend(&self) -> &Frontend {
        &self.frontend
    }

    pub fn matcher(&self) -> &TilingMatcher {
        &self.matcher
    }

    /// Run the full comparison pipeline over a submission set.
    pub fn run(&self, submission_set: &mut SubmissionSet) -> TesseraResult<RunResult> {
        self.run_with_cancellation(submission_set, &CancellationFlag::new())
    }

    /// Run the pipeline with an external cancellation flag. Cancellation
    /// is honored at pair granularity and yields a partial result.
    pub fn run_with_cancellation(
        &self,
        submission_set: &mut SubmissionSet,
        cancellation: &CancellationFlag,
    ) -> TesseraResult<RunResult> {
        let start = Instant::now();
        tracing::info!(
            "Tessera run: {} submissions, minimum token match {}",
            submission_set.submissions().len() + submission_set.old_submissions().len(),
            self.minimum_token_match,
        );

        if self.frontend.supports_normalization && self.frontend.tokens_have_semantics {
            submission_set.normalize_submissions();
        }

        let base_code_comparisons = self.mark_base_code(submission_set)?;

        let pairs = enumerate_pairs(submission_set);
        tracing::info!("Comparing {} submission pairs", pairs.len());

        let merging = MergingOptions::new(self.config.merge_buffer, self.config.merge_length);
        let metric = self.config.similarity_metric;
        let threshold = self.config.similarity_threshold;

        let retained: Vec<Comparison> = pairs
            .par_iter()
            .filter_map(|&(first, second)| {
                if cancellation.is_cancelled() {
                    return None;
                }
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    self.matcher.compare(first, second)
                }));
                let comparison = match outcome {
                    Ok(comparison) => comparison,
                    Err(_) => {
                        tracing::error!(
                            "Comparison of \"{}\" and \"{}\" failed; skipping the pair",
                            first.name(),
                            second.name(),
                        );
                        return None;
                    }
                };
                let comparison = if merging.enabled() {
                    merge_matches(&comparison, &merging)
                } else {
                    comparison
                };
                metric
                    .is_above_threshold(&comparison, threshold)
                    .then_some(comparison)
            })
            .collect();

        let comparisons = self.cap_comparisons(retained);
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Run complete: {} comparisons retained, {}ms",
            comparisons.len(),
            duration_ms,
        );

        Ok(RunResult {
            comparisons,
            base_code_comparisons,
            cancelled: cancellation.is_cancelled(),
            duration_ms,
        })
    }

    /// Compare every submission against the base code and record the
    /// covered regions. Must complete before any regular comparison; a
    /// failure here poisons the whole run.
    fn mark_base_code(
        &self,
        submission_set: &SubmissionSet,
    ) -> TesseraResult<BTreeMap<String, Comparison>> {
        let Some(base_code) = submission_set.base_code() else {
            return Ok(BTreeMap::new());
        };
        tracing::info!("Subtracting base code \"{}\"", base_code.name());

        let all: Vec<&Submission> = submission_set
            .submissions()
            .iter()
            .chain(submission_set.old_submissions().iter())
            .collect();

        let marked: Vec<TesseraResult<(String, Comparison)>> = all
            .par_iter()
            .map(|&submission| {
                std::panic::catch_unwind(AssertUnwindSafe(|| {
                    self.matcher.generate_base_code_marking(submission, base_code)
                }))
                .map(|comparison| (submission.name().to_string(), comparison))
                .map_err(|_| TesseraError::ResourceExhausted {
                    submission: submission.name().to_string(),
                })
            })
            .collect();

        let mut base_code_comparisons = BTreeMap::new();
        for result in marked {
            let (name, comparison) = result?;
            base_code_comparisons.insert(name, comparison);
        }
        Ok(base_code_comparisons)
    }

    /// Keep the top-scoring comparisons under the configured metric.
    /// A maximum of 0 keeps everything.
    fn cap_comparisons(&self, mut comparisons: Vec<Comparison>) -> Vec<Comparison> {
        let maximum = self.config.maximum_number_of_comparisons;
        if maximum == 0 || comparisons.len() <= maximum {
            return comparisons;
        }
        let metric = self.config.similarity_metric;
        comparisons.sort_by(|a, b| {
            metric
                .score(b)
                .partial_cmp(&metric.score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (&a.first_name, &a.second_name).cmp(&(&b.first_name, &b.second_name)))
        });
        tracing::info!(
            "Capping results: keeping {} of {} comparisons",
            maximum,
            comparisons.len(),
        );
        comparisons.truncate(maximum);
        comparisons
    }
}

impl std::fmt::Debug for TesseraEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TesseraEngine")
            .field("config", &self.config)
            .field("frontend", &self.frontend.name)
            .field("minimum_token_match", &self.minimum_token_match)
            .finish()
    }
}

/// Unordered pairs to compare: new×new plus new×old; old submissions
/// are never compared against each other.
fn enumerate_pairs(submission_set: &SubmissionSet) -> Vec<(&Submission, &Submission)> {
    let new = submission_set.submissions();
    let old = submission_set.old_submissions();

    let mut pairs = Vec::with_capacity(new.len() * (new.len().saturating_sub(1)) / 2 + new.len() * old.len());
    for (i, first) in new.iter().enumerate() {
        for second in &new[i + 1..] {
            pairs.push((first, second));
        }
        for second in old {
            pairs.push((first, second));
        }
    }
    pairs
}

// ─── Tests ──────────────────────────────────────────────────────────
