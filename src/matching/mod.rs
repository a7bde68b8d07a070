//! Greedy String Tiling — the token-sequence comparator
//!
//! Implements the Greedy String Tiling algorithm (Wise) accelerated by
//! running Karp-Rabin style subsequence hashing. A matcher instance is
//! thread-safe: submission pairs may be compared in parallel, sharing
//! the token-value interner and the per-submission caches.

pub mod hash_table;
pub mod interner;
pub mod merging;

pub use hash_table::{SubsequenceHashTable, NO_HASH};
pub use interner::{TokenValueInterner, FILE_END_VALUE};
pub use merging::{merge_matches, MergingOptions};

use crate::comparison::{Comparison, Match};
use crate::submission::{Submission, SubmissionId};
use crate::token::TokenType;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type CacheMap<T> = RwLock<HashMap<SubmissionId, Arc<OnceCell<T>>>>;

/// Thread-safe Greedy String Tiling matcher.
///
/// Per-submission derivatives (value-lists, hash indices, base-code
/// masks) are cached by submission identity and published once; callers
/// must finish any token-stream rewriting (normalization) before the
/// first comparison that involves a submission.
pub struct TilingMatcher {
    minimum_token_match: usize,
    merge_buffer: usize,
    /// Effective window length: `max(1, minimum_token_match - merge_buffer)`.
    minimum_match_length: usize,
    interner: TokenValueInterner,
    value_lists: CacheMap<Arc<Vec<u32>>>,
    hash_tables: CacheMap<Arc<SubsequenceHashTable>>,
    base_code_masks: RwLock<HashMap<SubmissionId, Vec<bool>>>,
}

impl TilingMatcher {
    pub fn new(minimum_token_match: usize, merge_buffer: usize) -> Self {
        let minimum_token_match = minimum_token_match.max(1);
        let minimum_match_length = minimum_token_match.saturating_sub(merge_buffer).max(1);
        Self {
            minimum_token_match,
            merge_buffer,
            minimum_match_length,
            interner: TokenValueInterner::new(),
            value_lists: RwLock::new(HashMap::new()),
            hash_tables: RwLock::new(HashMap::new()),
            base_code_masks: RwLock::new(HashMap::new()),
        }
    }

    pub fn minimum_token_match(&self) -> usize {
        self.minimum_token_match
    }

    pub fn minimum_match_length(&self) -> usize {
        self.minimum_match_length
    }

    /// Compare two submissions and produce their tiling.
    ///
    /// The smaller submission (ties broken by name) takes the `first`
    /// side of the resulting comparison.
    pub fn compare(&self, first: &Submission, second: &Submission) -> Comparison {
        let (left, right) = order_pair(first, second);
        self.compare_internal(left, right)
    }

    /// Compare a submission against the base code and record the covered
    /// positions as that submission's base-code mask. Must be called
    /// before any regular comparison involving the submission; calling
    /// it again with the same base code has no further effect.
    pub fn generate_base_code_marking(
        &self,
        submission: &Submission,
        base_code: &Submission,
    ) -> Comparison {
        let (left, _) = order_pair(submission, base_code);
        let submission_is_first = std::ptr::eq(left, submission);
        let comparison = self.compare(submission, base_code);

        let mut masks = self.base_code_masks.write().expect("base-code mask lock poisoned");
        let mask = masks
            .entry(submission.id())
            .or_insert_with(|| vec![false; submission.token_count()]);
        for matched in &comparison.matches {
            let start = if submission_is_first {
                matched.start_in_first
            } else {
                matched.start_in_second
            };
            for position in start..start + matched.length {
                mask[position] = true;
            }
        }
        drop(masks);

        // The cached hash index was built without the new markings;
        // discard it so the next comparison rebuilds it lazily.
        self.hash_tables
            .write()
            .expect("hash table lock poisoned")
            .remove(&submission.id());

        comparison
    }

    fn compare_internal(&self, left: &Submission, right: &Submission) -> Comparison {
        let empty = || {
            Comparison::empty(
                left.name(),
                right.name(),
                left.comparable_tokens(),
                right.comparable_tokens(),
            )
        };

        // The last token is the pivot; both tiling loops rely on it.
        if !ends_with_sentinel(left) || !ends_with_sentinel(right) {
            tracing::warn!(
                "Comparison of \"{}\" and \"{}\" skipped: token stream lacks the end sentinel",
                left.name(),
                right.name(),
            );
            return empty();
        }
        if left.token_count() <= self.minimum_match_length
            || right.token_count() <= self.minimum_match_length
        {
            return empty();
        }

        let left_values = self.value_list(left);
        let right_values = self.value_list(right);
        let mut left_marked = self.initially_marked(left);
        let mut right_marked = self.initially_marked(right);
        let left_table = self.hash_table(left, &left_values, &left_marked);
        let right_table = self.hash_table(right, &right_values, &right_marked);

        let mut global_matches: Vec<Match> = Vec::new();
        let mut ignored_matches: Vec<Match> = Vec::new();

        loop {
            let mut maximum_match_length = self.minimum_match_length;
            let mut iteration_matches: Vec<Match> = Vec::new();

            let mut left_start = 0;
            while left_start + maximum_match_length < left_values.len() {
                let left_hash = left_table.hash_for_start(left_start);
                if left_marked[left_start] || left_hash == NO_HASH {
                    left_start += 1;
                    continue;
                }
                for &right_start in right_table.starts_with_hash(left_hash) {
                    if right_marked[right_start]
                        || maximum_match_length >= right_values.len() - right_start
                    {
                        continue;
                    }
                    let length = maximal_unmarked_run(
                        &left_values,
                        left_start,
                        &left_marked,
                        &right_values,
                        right_start,
                        &right_marked,
                        maximum_match_length,
                    );
                    if length >= maximum_match_length {
                        if length > maximum_match_length {
                            iteration_matches.clear();
                            maximum_match_length = length;
                        }
                        add_if_not_overlapping(
                            &mut iteration_matches,
                            Match::new(left_start, right_start, length),
                        );
                    }
                }
                left_start += 1;
            }

            for matched in &iteration_matches {
                if matched.length < self.minimum_match_length + self.merge_buffer {
                    add_if_not_overlapping(&mut ignored_matches, *matched);
                } else {
                    add_if_not_overlapping(&mut global_matches, *matched);
                }
                for offset in 0..matched.length {
                    left_marked[matched.start_in_first + offset] = true;
                    right_marked[matched.start_in_second + offset] = true;
                }
            }

            if maximum_match_length == self.minimum_match_length {
                break;
            }
        }

        Comparison {
            first_name: left.name().to_string(),
            second_name: right.name().to_string(),
            first_token_count: left.comparable_tokens(),
            second_token_count: right.comparable_tokens(),
            matches: global_matches,
            ignored_matches,
        }
    }

    /// The interned value list of a submission, computed once.
    fn value_list(&self, submission: &Submission) -> Arc<Vec<u32>> {
        let cell = cache_cell(&self.value_lists, submission.id());
        cell.get_or_init(|| {
            Arc::new(
                submission
                    .tokens()
                    .iter()
                    .map(|token| self.interner.value_of(&token.token_type))
                    .collect(),
            )
        })
        .clone()
    }

    /// The subsequence hash index of a submission, computed once per
    /// marking state (rebuilt after base-code marking invalidates it).
    fn hash_table(
        &self,
        submission: &Submission,
        values: &[u32],
        marked: &[bool],
    ) -> Arc<SubsequenceHashTable> {
        let cell = cache_cell(&self.hash_tables, submission.id());
        cell.get_or_init(|| {
            Arc::new(SubsequenceHashTable::new(
                self.minimum_match_length,
                values,
                marked,
            ))
        })
        .clone()
    }

    /// The initial marked-bitmap: excluded token types plus any recorded
    /// base-code positions.
    fn initially_marked(&self, submission: &Submission) -> Vec<bool> {
        let mut marked: Vec<bool> = submission
            .tokens()
            .iter()
            .map(|token| token.token_type.is_excluded_from_matching())
            .collect();

        let masks = self.base_code_masks.read().expect("base-code mask lock poisoned");
        if let Some(mask) = masks.get(&submission.id()) {
            if mask.len() == marked.len() {
                for (flag, &base) in marked.iter_mut().zip(mask) {
                    *flag |= base;
                }
            } else {
                tracing::warn!(
                    "Base-code mask of \"{}\" is stale ({} positions, stream has {}); ignoring it",
                    submission.name(),
                    mask.len(),
                    marked.len(),
                );
            }
        }
        marked
    }
}

impl std::fmt::Debug for TilingMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TilingMatcher")
            .field("minimum_token_match", &self.minimum_token_match)
            .field("merge_buffer", &self.merge_buffer)
            .field("minimum_match_length", &self.minimum_match_length)
            .field("interned_types", &self.interner.len())
            .finish_non_exhaustive()
    }
}

/// Order a pair so the smaller token sequence takes the first side,
/// ties broken by name.
fn order_pair<'a>(a: &'a Submission, b: &'a Submission) -> (&'a Submission, &'a Submission) {
    if a.token_count() > b.token_count()
        || (a.token_count() == b.token_count() && a.name() > b.name())
    {
        (b, a)
    } else {
        (a, b)
    }
}

fn ends_with_sentinel(submission: &Submission) -> bool {
    submission
        .tokens()
        .last()
        .is_some_and(|token| token.token_type == TokenType::FileEnd)
}

/// The maximal run of equal, unmarked values at the two start indices.
///
/// The first `minimum_length` positions are verified backwards (the
/// farther apart two tokens are, the likelier they differ); a single
/// mismatch or marked position rejects the candidate outright. The
/// forward extension carries no bounds test: the marked sentinel at the
/// end of both sequences stops it.
fn maximal_unmarked_run(
    left_values: &[u32],
    left_start: usize,
    left_marked: &[bool],
    right_values: &[u32],
    right_start: usize,
    right_marked: &[bool],
    minimum_length: usize,
) -> usize {
    for offset in (0..minimum_length).rev() {
        let left_index = left_start + offset;
        let right_index = right_start + offset;
        if left_values[left_index] != right_values[right_index]
            || left_marked[left_index]
            || right_marked[right_index]
        {
            return 0;
        }
    }

    let mut offset = minimum_length;
    while left_values[left_start + offset] == right_values[right_start + offset]
        && !left_marked[left_start + offset]
        && !right_marked[right_start + offset]
    {
        offset += 1;
    }
    offset
}

/// Append a match unless it overlaps one already collected. Scanning in
/// reverse insertion order biases rejection toward the newest matches,
/// keeping earlier discoveries stable.
fn add_if_not_overlapping(matches: &mut Vec<Match>, candidate: Match) {
    for existing in matches.iter().rev() {
        if existing.overlaps(&candidate) {
            return;
        }
    }
    matches.push(candidate);
}

fn cache_cell<T>(map: &CacheMap<T>, id: SubmissionId) -> Arc<OnceCell<T>> {
    if let Some(cell) = map.read().expect("cache lock poisoned").get(&id) {
        return cell.clone();
    }
    map.write()
        .expect("cache lock poisoned")
        .entry(id)
        .or_insert_with(|| Arc::new(OnceCell::new()))
        .clone()
}

// ─── Tests ──────────────────────────────────────────────────────────
