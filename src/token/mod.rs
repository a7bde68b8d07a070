//! Token model — the unit of comparison
//!
//! Front-ends reduce every source file to a stream of [`Token`]s. The
//! matcher never inspects source text; everything downstream (tiling,
//! normalization, reporting) operates on these tokens and their
//! [`TokenType`] tags.

pub mod semantics;

pub use semantics::{TokenSemantics, Variable};

use serde::{Deserialize, Serialize};

/// Placeholder for unavailable positional data (line, column, length).
pub const NO_VALUE: i32 = -1;

// ─── Token Type ─────────────────────────────────────────────────────

/// The category of a token, drawn from a finite, language-specific set.
///
/// Two values are reserved and shared across all front-ends: `FileEnd`
/// terminates every token list and acts as the matching pivot, and
/// `Separator` is reserved but never emitted. Both are excluded from
/// matching, which is what keeps the tiling loops from running across
/// submission boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// End-of-submission sentinel, appended exactly once per token list.
    FileEnd,
    /// Reserved pivot value, never emitted by front-ends.
    Separator,
    /// A language-specific token category. `ordinal` reflects the
    /// declaration order within the front-end's token set and drives the
    /// canonical statement ordering during normalization.
    Syntax {
        name: String,
        ordinal: u32,
        excluded: bool,
    },
}

impl TokenType {
    /// A regular language token category.
    pub fn syntax(name: impl Into<String>, ordinal: u32) -> Self {
        TokenType::Syntax {
            name: name.into(),
            ordinal,
            excluded: false,
        }
    }

    /// A token category the front-end classifies as irrelevant for
    /// matching (whitespace-equivalents, comments).
    pub fn syntax_excluded(name: impl Into<String>, ordinal: u32) -> Self {
        TokenType::Syntax {
            name: name.into(),
            ordinal,
            excluded: true,
        }
    }

    /// Whether positions of this type are pre-marked and never matched.
    pub fn is_excluded_from_matching(&self) -> bool {
        match self {
            TokenType::FileEnd | TokenType::Separator => true,
            TokenType::Syntax { excluded, .. } => *excluded,
        }
    }

    /// Declaration-order ordinal used by the statement comparator.
    /// Sentinels sort after every language token.
    pub fn ordinal(&self) -> u32 {
        match self {
            TokenType::Syntax { ordinal, .. } => *ordinal,
            TokenType::Separator => u32::MAX - 1,
            TokenType::FileEnd => u32::MAX,
        }
    }

    /// Display name of the category.
    pub fn name(&self) -> &str {
        match self {
            TokenType::FileEnd => "FILE_END",
            TokenType::Separator => "SEPARATOR",
            TokenType::Syntax { name, .. } => name,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Token ──────────────────────────────────────────────────────────

/// A single structural token with its source position.
///
/// `line`, `column` and `length` are 1-based, or [`NO_VALUE`] when the
/// front-end cannot provide them. The `FileEnd` sentinel always carries
/// `line == NO_VALUE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    /// Identifier of the source file this token came from.
    pub file: String,
    pub line: i32,
    pub column: i32,
    pub length: i32,
    /// Semantic annotation; present only when the front-end reports
    /// `tokens_have_semantics`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub semantics: Option<TokenSemantics>,
}

impl Token {
    pub fn new(token_type: TokenType, file: impl Into<String>, line: i32, column: i32, length: i32) -> Self {
        Self {
            token_type,
            file: file.into(),
            line,
            column,
            length,
            semantics: None,
        }
    }

    /// The end-of-submission sentinel for the given file.
    pub fn file_end(file: impl Into<String>) -> Self {
        Self {
            token_type: TokenType::FileEnd,
            file: file.into(),
            line: NO_VALUE,
            column: NO_VALUE,
            length: NO_VALUE,
            semantics: None,
        }
    }

    /// Attach a semantic annotation.
    pub fn with_semantics(mut self, semantics: TokenSemantics) -> Self {
        self.semantics = Some(semantics);
        self
    }

    /// Whether this token carries usable line information.
    pub fn has_position(&self) -> bool {
        self.line != NO_VALUE
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_position() {
            write!(f, "{}({}:{})", self.token_type, self.file, self.line)
        } else {
            write!(f, "{}", self.token_type)
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
