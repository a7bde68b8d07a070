//! Per-token semantic annotations consumed by the normalizer.
//!
//! Front-ends that support normalization tag every token with the
//! variables it reads and writes plus two behavioral flags: `critical`
//! (observable behavior — I/O, calls with side effects) and `control`
//! (alters control flow). The normalizer merges these per statement and
//! uses them to decide which statements survive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An opaque variable identity as reported by the front-end.
///
/// Front-ends are responsible for scoping: two occurrences of the same
/// `Variable` refer to the same storage location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Semantic annotation of a single token, or of a whole statement after
/// merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSemantics {
    /// Contributes to observable behavior; must never be removed.
    pub critical: bool,
    /// Alters control flow; pins surrounding statement order.
    pub control: bool,
    /// Variables read by this token.
    pub reads: BTreeSet<Variable>,
    /// Variables written by this token.
    pub writes: BTreeSet<Variable>,
}

impl TokenSemantics {
    /// An annotation with no flags and no variable accesses.
    pub fn plain() -> Self {
        Self::default()
    }

    /// An annotation for behavior-critical tokens.
    pub fn critical() -> Self {
        Self {
            critical: true,
            ..Self::default()
        }
    }

    /// An annotation for control-flow tokens.
    pub fn control() -> Self {
        Self {
            control: true,
            ..Self::default()
        }
    }

    pub fn with_read(mut self, variable: Variable) -> Self {
        self.reads.insert(variable);
        self
    }

    pub fn with_write(mut self, variable: Variable) -> Self {
        self.writes.insert(variable);
        self
    }

    /// Merge the annotations of all tokens in a statement: flags are
    /// or-ed, variable sets are unioned.
    pub fn join<'a>(parts: impl IntoIterator<Item = &'a TokenSemantics>) -> Self {
        let mut merged = TokenSemantics::default();
        for part in parts {
            merged.critical |= part.critical;
            merged.control |= part.control;
            merged.reads.extend(part.reads.iter().cloned());
            merged.writes.extend(part.writes.iter().cloned());
        }
        merged
    }
}
