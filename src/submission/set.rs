//! Submission collection — validity filtering and the normalization pass

use super::Submission;
use crate::language::ParseError;
use crate::normalization::normalize_tokens;
use crate::token::Token;
use crate::{TesseraError, TesseraResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A submission excluded from the run, with the reason it was dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidSubmission {
    pub name: String,
    pub reason: String,
}

/// All submissions of one run: the new candidates, the old submissions
/// they are additionally checked against, the optional base code, and
/// everything that failed validation.
#[derive(Debug)]
pub struct SubmissionSet {
    submissions: Vec<Submission>,
    old_submissions: Vec<Submission>,
    invalid: Vec<InvalidSubmission>,
    base_code: Option<Submission>,
    minimum_token_match: usize,
}

impl SubmissionSet {
    /// Assemble a validated submission set.
    ///
    /// Too-short submissions are excluded with a warning; a too-short
    /// base code or a set with fewer than two usable submissions is
    /// fatal for the whole run.
    pub fn build(
        new_submissions: Vec<Submission>,
        old_submissions: Vec<Submission>,
        base_code: Option<Submission>,
        minimum_token_match: usize,
    ) -> TesseraResult<Self> {
        let minimum_tokens = minimum_token_match + 1;

        if let Some(base) = &base_code {
            if base.token_count() < minimum_tokens {
                return Err(TesseraError::BaseCodeTooShort {
                    name: base.name().to_string(),
                    tokens: base.token_count(),
                    minimum: minimum_tokens,
                });
            }
        }

        let mut invalid = Vec::new();
        let submissions = Self::filter_valid(new_submissions, minimum_tokens, &mut invalid);
        let old_submissions = Self::filter_valid(old_submissions, minimum_tokens, &mut invalid);

        let usable = submissions.len() + old_submissions.len();
        if submissions.is_empty() || usable < 2 {
            return Err(TesseraError::TooFewSubmissions { valid: usable });
        }

        tracing::info!(
            "Submission set: {} new, {} old, {} invalid, base code: {}",
            submissions.len(),
            old_submissions.len(),
            invalid.len(),
            base_code.as_ref().map(|b| b.name()).unwrap_or("none"),
        );

        Ok(Self {
            submissions,
            old_submissions,
            invalid,
            base_code,
            minimum_token_match,
        })
    }

    /// Assemble a set directly from front-end parse results. Parse
    /// failures become invalid submissions instead of aborting the run.
    pub fn from_parse_results(
        new_results: Vec<(String, Result<Vec<Token>, ParseError>)>,
        old_results: Vec<(String, Result<Vec<Token>, ParseError>)>,
        base_code: Option<Submission>,
        minimum_token_match: usize,
    ) -> TesseraResult<Self> {
        let mut parse_failures = Vec::new();
        let new_submissions = Self::collect_parsed(new_results, &mut parse_failures);
        let old_submissions = Self::collect_parsed(old_results, &mut parse_failures);

        let mut set = Self::build(new_submissions, old_submissions, base_code, minimum_token_match)?;
        set.invalid.extend(parse_failures);
        Ok(set)
    }

    fn collect_parsed(
        results: Vec<(String, Result<Vec<Token>, ParseError>)>,
        failures: &mut Vec<InvalidSubmission>,
    ) -> Vec<Submission> {
        let mut submissions = Vec::with_capacity(results.len());
        for (name, result) in results {
            match result {
                Ok(tokens) => submissions.push(Submission::new(name, tokens)),
                Err(error) => {
                    tracing::warn!("Excluding submission \"{}\": {}", name, error);
                    failures.push(InvalidSubmission {
                        name,
                        reason: error.to_string(),
                    });
                }
            }
        }
        submissions
    }

    fn filter_valid(
        submissions: Vec<Submission>,
        minimum_tokens: usize,
        invalid: &mut Vec<InvalidSubmission>,
    ) -> Vec<Submission> {
        submissions
            .into_iter()
            .filter_map(|submission| {
                if submission.token_count() < minimum_tokens {
                    tracing::warn!(
                        "Excluding submission \"{}\": {} tokens, minimum is {}",
                        submission.name(),
                        submission.token_count(),
                        minimum_tokens,
                    );
                    invalid.push(InvalidSubmission {
                        name: submission.name().to_string(),
                        reason: format!(
                            "too few tokens ({} < {})",
                            submission.token_count(),
                            minimum_tokens
                        ),
                    });
                    None
                } else {
                    Some(submission)
                }
            })
            .collect()
    }

    /// Rewrite every submission's token stream through the normalization
    /// graph. Runs once per submission, before any comparison; streams
    /// without semantics pass through unchanged.
    pub fn normalize_submissions(&mut self) {
        let normalize_one = |submission: &mut Submission| {
            let before = submission.token_count();
            let normalized = normalize_tokens(submission.tokens().to_vec());
            if normalized.len() != before {
                tracing::debug!(
                    "Normalized \"{}\": {} -> {} tokens",
                    submission.name(),
                    before,
                    normalized.len(),
                );
            }
            submission.set_tokens(normalized);
        };

        self.submissions.par_iter_mut().for_each(normalize_one);
        self.old_submissions.par_iter_mut().for_each(normalize_one);
        if let Some(base) = self.base_code.as_mut() {
            normalize_one(base);
        }
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn old_submissions(&self) -> &[Submission] {
        &self.old_submissions
    }

    pub fn invalid_submissions(&self) -> &[InvalidSubmission] {
        &self.invalid
    }

    pub fn base_code(&self) -> Option<&Submission> {
        self.base_code.as_ref()
    }

    pub fn minimum_token_match(&self) -> usize {
        self.minimum_token_match
    }

    /// Look up any valid submission (new, old, or base code) by name.
    pub fn submission_by_name(&self, name: &str) -> Option<&Submission> {
        self.submissions
            .iter()
            .chain(self.old_submissions.iter())
            .chain(self.base_code.iter())
            .find(|submission| submission.name() == name)
    }
}
