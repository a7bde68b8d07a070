//! Language front-end contract
//!
//! Parsing lives outside this crate. A front-end is described by a small
//! capability struct passed by value rather than a trait object: the
//! engine only ever needs the advertised capabilities and one parse
//! entry point, and a plain struct keeps the seam data-only and easy to
//! stub in tests.

use crate::token::Token;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a front-end to produce a token stream for one submission.
#[derive(Debug, Clone, Error)]
#[error("failed to parse {file}: {message}")]
pub struct ParseError {
    /// The offending file, as named by the front-end.
    pub file: String,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Parse entry point of a front-end.
///
/// The returned stream MUST terminate with exactly one `FileEnd` token.
/// When `normalize` is true and the front-end supports normalization,
/// every non-sentinel token MUST carry semantics.
pub type ParseFn = dyn Fn(&[PathBuf], bool) -> Result<Vec<Token>, ParseError> + Send + Sync;

/// Capabilities of one language front-end.
#[derive(Clone)]
pub struct Frontend {
    /// Display name, e.g. `"java"`.
    pub name: String,
    /// Accepted filename suffixes, e.g. `[".java"]`.
    pub suffixes: Vec<String>,
    /// Default minimum token match when the caller does not override it.
    pub minimum_token_match: usize,
    /// Whether emitted tokens carry semantic annotations.
    pub tokens_have_semantics: bool,
    /// Whether the token stream may be rewritten by the normalizer.
    pub supports_normalization: bool,
    pub parse: Arc<ParseFn>,
}

impl Frontend {
    /// Whether the front-end accepts the given file name.
    pub fn accepts(&self, file_name: &str) -> bool {
        self.suffixes.iter().any(|suffix| file_name.ends_with(suffix.as_str()))
    }

    /// Invoke the front-end parser.
    pub fn parse(&self, files: &[PathBuf], normalize: bool) -> Result<Vec<Token>, ParseError> {
        (self.parse)(files, normalize)
    }
}

impl std::fmt::Debug for Frontend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frontend")
            .field("name", &self.name)
            .field("suffixes", &self.suffixes)
            .field("minimum_token_match", &self.minimum_token_match)
            .field("tokens_have_semantics", &self.tokens_have_semantics)
            .field("supports_normalization", &self.supports_normalization)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    fn stub_frontend() -> Frontend {
        Frontend {
            name: "stub".into(),
            suffixes: vec![".st".into()],
            minimum_token_match: 9,
            tokens_have_semantics: false,
            supports_normalization: false,
            parse: Arc::new(|files, _normalize| {
                if files.is_empty() {
                    return Err(ParseError::new("<none>", "no input files"));
                }
                Ok(vec![
                    Token::new(TokenType::syntax("UNIT", 0), "a.st", 1, 1, 1),
                    Token::file_end("a.st"),
                ])
            }),
        }
    }

    #[test]
    fn test_accepts_by_suffix() {
        let frontend = stub_frontend();
        assert!(frontend.accepts("Main.st"));
        assert!(!frontend.accepts("Main.java"));
    }

    #[test]
    fn test_parse_round_trip() {
        let frontend = stub_frontend();
        let tokens = frontend.parse(&[PathBuf::from("a.st")], false).unwrap();
        assert_eq!(tokens.last().unwrap().token_type, TokenType::FileEnd);

        let error = frontend.parse(&[], false).unwrap_err();
        assert!(error.to_string().contains("no input files"));
    }
}
