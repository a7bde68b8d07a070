//! Token-type interning — dense integer values for fast equality
//!
//! The tiling loops compare millions of token pairs; comparing interned
//! `u32` values instead of [`TokenType`] structs keeps the inner loop
//! branch-free. Values are assigned on first sight and never change for
//! the lifetime of a matcher.

use crate::token::TokenType;
use std::collections::HashMap;
use std::sync::RwLock;

/// The interner value reserved for the `FileEnd` sentinel.
pub const FILE_END_VALUE: u32 = 0;

/// Insert-only mapping from token types to dense non-negative integers.
///
/// Reads take the read side of the lock only, so concurrent queries on
/// previously-seen types do not block each other; the write lock is held
/// exactly once per distinct type across the whole run.
#[derive(Debug)]
pub struct TokenValueInterner {
    values: RwLock<HashMap<TokenType, u32>>,
}

impl TokenValueInterner {
    pub fn new() -> Self {
        let mut values = HashMap::new();
        values.insert(TokenType::FileEnd, FILE_END_VALUE);
        Self {
            values: RwLock::new(values),
        }
    }

    /// The dense value of a token type, assigning the next free value on
    /// first sight.
    pub fn value_of(&self, token_type: &TokenType) -> u32 {
        if let Some(&value) = self.values.read().expect("interner lock poisoned").get(token_type) {
            return value;
        }
        let mut values = self.values.write().expect("interner lock poisoned");
        let next = values.len() as u32;
        *values.entry(token_type.clone()).or_insert(next)
    }

    /// Number of distinct types seen so far (sentinel included).
    pub fn len(&self) -> usize {
        self.values.read().expect("interner lock poisoned").len()
    }

    /// Never empty: the sentinel is seeded at construction.
    pub fn is_empty(&self) -> bool {
        self.values.read().expect("interner lock poisoned").is_empty()
    }
}

impl Default for TokenValueInterner {
    fn default() -> Self {
        Self::new()
    }
}
