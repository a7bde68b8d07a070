//! Submissions — one author's files reduced to a token sequence

pub mod set;

pub use set::{InvalidSubmission, SubmissionSet};

use crate::language::{Frontend, ParseError};
use crate::token::{Token, TokenType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a submission within one process.
///
/// Matcher caches are keyed by this value rather than by reference, so a
/// submission never owns (or cycles with) its own derived data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(u64);

static NEXT_SUBMISSION_ID: AtomicU64 = AtomicU64::new(1);

impl SubmissionId {
    fn next() -> Self {
        SubmissionId(NEXT_SUBMISSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A set of source files attributed to one author, reduced to a single
/// concatenated token sequence terminated by the `FileEnd` sentinel.
#[derive(Debug, Clone)]
pub struct Submission {
    id: SubmissionId,
    name: String,
    tokens: Vec<Token>,
}

impl Submission {
    pub fn new(name: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            id: SubmissionId::next(),
            name: name.into(),
            tokens,
        }
    }

    /// Parse a submission through a front-end. A parse failure leaves the
    /// submission out of the run but does not abort it; the caller routes
    /// the error into [`SubmissionSet::from_parse_results`].
    pub fn parse(
        name: impl Into<String>,
        files: &[PathBuf],
        frontend: &Frontend,
        normalize: bool,
    ) -> Result<Self, ParseError> {
        let tokens = frontend.parse(files, normalize && frontend.supports_normalization)?;
        Ok(Self::new(name, tokens))
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Total sequence length, sentinel included.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens that participate in similarity divisors: everything except
    /// the `FileEnd` sentinel.
    pub fn comparable_tokens(&self) -> usize {
        self.tokens
            .iter()
            .filter(|token| token.token_type != TokenType::FileEnd)
            .count()
    }

    /// Replace the token stream in place (normalization rewrite). The
    /// submission keeps its identity; matcher caches keyed by it must be
    /// populated only after this has happened.
    pub(crate) fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }
}
