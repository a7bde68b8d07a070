//! # tessera — Token-Based Source Plagiarism Detection Engine
//!
//! Compares programming submissions as streams of structural tokens and
//! reports pairs that share suspiciously long identical subsequences,
//! together with similarity scores and the matched regions.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       TesseraEngine                          │
//! │  ┌────────────┐ ┌─────────────┐ ┌──────────────────────┐    │
//! │  │Submission  │ │Normalization│ │ TilingMatcher        │    │
//! │  │Set (valid/ │ │Graph (keep +│ │ (greedy string tiling│    │
//! │  │invalid)    │ │ linearize)  │ │  + subsequence hash) │    │
//! │  └─────┬──────┘ └──────┬──────┘ └──────────┬───────────┘    │
//! │        │               │                   │                │
//! │  ┌─────▼───────────────▼───────────────────▼─────────────┐  │
//! │  │  All-pairs driver (rayon) — base-code subtraction,    │  │
//! │  │  match merging, threshold filter, top-N cap           │  │
//! │  └──────────────────────────┬────────────────────────────┘  │
//! │                             │                               │
//! │  ┌──────────────────────────▼────────────────────────────┐  │
//! │  │ Report boundary: per-pair JSON records + run overview │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Language front-ends live outside this crate; they hand over token
//! streams through the [`language::Frontend`] capability struct. File
//! traversal, CLI handling, clustering, and report rendering are
//! likewise external.
//!
//! ## Quick start
//!
//! ```no_run
//! use tessera::{Submission, SubmissionSet, TesseraConfig, TesseraEngine};
//! # fn frontend() -> tessera::language::Frontend { unimplemented!() }
//! # fn parsed(_: &str) -> Vec<tessera::token::Token> { unimplemented!() }
//!
//! # fn main() -> tessera::TesseraResult<()> {
//! let engine = TesseraEngine::new(TesseraConfig::default(), frontend());
//! let mut submissions = SubmissionSet::build(
//!     vec![
//!         Submission::new("alice", parsed("alice/")),
//!         Submission::new("bob", parsed("bob/")),
//!     ],
//!     vec![],
//!     None,
//!     engine.minimum_token_match(),
//! )?;
//! let result = engine.run(&mut submissions)?;
//! for comparison in &result.comparisons {
//!     println!("{}", comparison);
//! }
//! # Ok(())
//! # }
//! ```

pub mod comparison;
pub mod engine;
pub mod language;
pub mod matching;
pub mod normalization;
pub mod report;
pub mod submission;
pub mod token;

// Re-exports for convenience
pub use comparison::{Comparison, Match, SimilarityMetric};
pub use engine::{CancellationFlag, RunResult, TesseraConfig, TesseraEngine};
pub use language::{Frontend, ParseError};
pub use matching::{merge_matches, MergingOptions, TilingMatcher};
pub use normalization::normalize_tokens;
pub use submission::{Submission, SubmissionSet};
pub use token::{Token, TokenSemantics, TokenType, Variable, NO_VALUE};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("submission \"{submission}\" could not be parsed: {source}")]
    Parse {
        submission: String,
        #[source]
        source: ParseError,
    },

    #[error("base code \"{name}\" has too few tokens ({tokens}, minimum {minimum})")]
    BaseCodeTooShort {
        name: String,
        tokens: usize,
        minimum: usize,
    },

    #[error("not enough valid submissions to compare ({valid} left after filtering)")]
    TooFewSubmissions { valid: usize },

    #[error("resource exhaustion while matching submission \"{submission}\"")]
    ResourceExhausted { submission: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type TesseraResult<T> = Result<T, TesseraError>;
