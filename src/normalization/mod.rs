//! Token-stream normalization
//!
//! Rewrites a token stream into a canonical form that is stable under
//! two common obfuscations: inserting dead statements and reordering
//! independent ones. Statements that cannot influence observable
//! behavior are dropped; the survivors are emitted in a canonical
//! topological order derived from their data and control dependencies.

mod graph;
mod statement;

use crate::token::{Token, TokenType};
use graph::NormalizationGraph;
use statement::group_statements;

/// Normalize a token stream.
///
/// The trailing `FileEnd` sentinel is preserved. Streams whose tokens
/// carry no semantics pass through unchanged: there is nothing safe to
/// remove without knowing what each statement touches.
pub fn normalize_tokens(mut tokens: Vec<Token>) -> Vec<Token> {
    let sentinel = match tokens.last() {
        Some(token) if token.token_type == TokenType::FileEnd => tokens.pop(),
        _ => None,
    };

    if tokens.is_empty() {
        return sentinel.into_iter().collect();
    }
    if tokens.iter().any(|token| token.semantics.is_none()) {
        tracing::debug!("Skipping normalization: token stream carries no semantics");
        tokens.extend(sentinel);
        return tokens;
    }

    let statements = group_statements(&tokens);
    let mut normalized = NormalizationGraph::new(statements).linearize();
    normalized.extend(sentinel);
    normalized
}
