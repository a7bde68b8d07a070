//! Shared helpers for the integration suites.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::Arc;
use tessera::language::Frontend;
use tessera::{Submission, Token, TokenSemantics, TokenType, Variable};

/// Build a submission from a letter stream: each distinct letter is a
/// distinct token type, and the `FileEnd` sentinel is appended.
pub fn letters(name: &str, stream: &str) -> Submission {
    Submission::new(name, letter_tokens(stream))
}

pub fn letter_tokens(stream: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = stream
        .chars()
        .enumerate()
        .map(|(index, letter)| {
            Token::new(
                TokenType::syntax(letter.to_string(), letter as u32),
                "src.x",
                1 + index as i32,
                1,
                1,
            )
        })
        .collect();
    tokens.push(Token::file_end("src.x"));
    tokens
}

/// A front-end stub for engine-level tests. The parse closure is never
/// exercised; submissions are built directly from token streams.
pub fn frontend(minimum_token_match: usize, with_semantics: bool) -> Frontend {
    Frontend {
        name: "letters".into(),
        suffixes: vec![".txt".into()],
        minimum_token_match,
        tokens_have_semantics: with_semantics,
        supports_normalization: with_semantics,
        parse: Arc::new(|_, _| Ok(Vec::new())),
    }
}

/// A one-token statement with full semantics, for normalization tests.
pub fn statement(
    name: &str,
    ordinal: u32,
    line: i32,
    critical: bool,
    reads: &[&str],
    writes: &[&str],
) -> Token {
    let mut semantics = if critical {
        TokenSemantics::critical()
    } else {
        TokenSemantics::plain()
    };
    for read in reads {
        semantics = semantics.with_read(Variable::new(*read));
    }
    for write in writes {
        semantics = semantics.with_write(Variable::new(*write));
    }
    Token::new(TokenType::syntax(name, ordinal), "f.x", line, 1, 1).with_semantics(semantics)
}

/// Token-type names of a stream, the usual equality basis in tests.
pub fn type_names(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.token_type.name().to_string())
        .collect()
}
