//! Statements — line-level units of the normalization graph

use crate::token::{Token, TokenSemantics};

/// A maximal run of tokens sharing the same source line of one file,
/// with the merged semantics of its tokens.
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    tokens: Vec<Token>,
    line_number: i32,
    semantics: TokenSemantics,
    keep: bool,
}

impl Statement {
    pub(crate) fn new(tokens: Vec<Token>, line_number: i32) -> Self {
        let semantics = TokenSemantics::join(tokens.iter().filter_map(|t| t.semantics.as_ref()));
        let keep = semantics.critical || semantics.control;
        Self {
            tokens,
            line_number,
            semantics,
            keep,
        }
    }

    pub(crate) fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn line_number(&self) -> i32 {
        self.line_number
    }

    pub(crate) fn semantics(&self) -> &TokenSemantics {
        &self.semantics
    }

    pub(crate) fn keep(&self) -> bool {
        self.keep
    }

    pub(crate) fn mark_keep(&mut self) {
        self.keep = true;
    }

    /// Token-type ordinals in stream order; the secondary key of the
    /// canonical statement ordering.
    pub(crate) fn ordinals(&self) -> Vec<u32> {
        self.tokens.iter().map(|t| t.token_type.ordinal()).collect()
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<String> = self.tokens.iter().map(|t| t.token_type.to_string()).collect();
        write!(f, "{}: {}", self.line_number, types.join(" "))
    }
}

/// Group a token stream into statements: every maximal run of tokens
/// that agree on (file, line) becomes one statement.
pub(crate) fn group_statements(tokens: &[Token]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for token in tokens {
        let breaks_run = current
            .last()
            .is_some_and(|last: &Token| last.line != token.line || last.file != token.file);
        if breaks_run {
            let line = current[0].line;
            statements.push(Statement::new(std::mem::take(&mut current), line));
        }
        current.push(token.clone());
    }
    if !current.is_empty() {
        let line = current[0].line;
        statements.push(Statement::new(current, line));
    }
    statements
}
