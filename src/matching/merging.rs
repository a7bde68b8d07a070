//! Match merging — neighborhood post-pass over a finished tiling
//!
//! Obfuscated copies often break one long match into several shorter
//! ones by touching a token here and there. This pass re-joins accepted
//! matches separated by small gaps, optionally hopping across
//! `ignored_matches` (matches that reached the shrunken search window
//! but fell short of the minimum token match) as bridges.
//!
//! Gap measure: a gap is counted from the end of the previous chain
//! element to the start of the next one on the same side
//! (`next.start - prev.end`). Every hop in the chain must stay within
//! `merge_buffer` on both sides, and the whole bridged span between two
//! accepted matches must stay within `merge_length` (0 = unlimited).

use crate::comparison::{Comparison, Match};
use serde::{Deserialize, Serialize};

/// Parameters of the merging post-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergingOptions {
    /// Maximum gap, in tokens, between consecutive chain elements.
    /// 0 disables merging entirely.
    pub merge_buffer: usize,
    /// Maximum total span bridged between two accepted matches.
    /// 0 means unlimited.
    pub merge_length: usize,
}

impl Default for MergingOptions {
    fn default() -> Self {
        Self {
            merge_buffer: 0,
            merge_length: 0,
        }
    }
}

impl MergingOptions {
    pub fn new(merge_buffer: usize, merge_length: usize) -> Self {
        Self {
            merge_buffer,
            merge_length,
        }
    }

    pub fn enabled(&self) -> bool {
        self.merge_buffer > 0
    }
}

/// Merge near-adjacent matches of a comparison into single covering
/// matches. The input sets are non-overlapping within themselves; the
/// output accepted set remains non-overlapping, and ignored matches
/// consumed as bridges (or covered by a merged match) are dropped.
pub fn merge_matches(comparison: &Comparison, options: &MergingOptions) -> Comparison {
    if !options.enabled() || comparison.matches.len() < 2 {
        return comparison.clone();
    }

    let mut accepted = comparison.matches.clone();
    accepted.sort_by_key(|m| m.start_in_first);
    let mut bridges = comparison.ignored_matches.clone();
    bridges.sort_by_key(|m| m.start_in_first);

    // Repeatedly merge the first mergeable neighbor pair; a merged match
    // may itself become mergeable with its new neighbor.
    let mut merged_any = true;
    while merged_any {
        merged_any = false;
        let mut index = 0;
        while index + 1 < accepted.len() {
            let lower = accepted[index];
            let upper = accepted[index + 1];
            if let Some(merged) = try_merge(&lower, &upper, &bridges, options, comparison) {
                let conflicts = accepted
                    .iter()
                    .enumerate()
                    .any(|(i, other)| i != index && i != index + 1 && merged.overlaps(other));
                if !conflicts {
                    accepted[index] = merged;
                    accepted.remove(index + 1);
                    bridges.retain(|bridge| !merged.overlaps(bridge));
                    merged_any = true;
                    continue;
                }
            }
            index += 1;
        }
    }

    // Anything the merged ranges now cover is no longer a bridge
    // candidate for downstream consumers.
    bridges.retain(|bridge| !accepted.iter().any(|m| m.overlaps(bridge)));

    Comparison {
        first_name: comparison.first_name.clone(),
        second_name: comparison.second_name.clone(),
        first_token_count: comparison.first_token_count,
        second_token_count: comparison.second_token_count,
        matches: accepted,
        ignored_matches: bridges,
    }
}

/// Attempt to bridge `lower` to `upper` through ignored matches.
/// Returns the covering match on success.
fn try_merge(
    lower: &Match,
    upper: &Match,
    bridges: &[Match],
    options: &MergingOptions,
    comparison: &Comparison,
) -> Option<Match> {
    // Consistent ordering on both sides is required.
    if upper.start_in_first < lower.end_in_first() || upper.start_in_second < lower.end_in_second()
    {
        return None;
    }

    let span_first = upper.start_in_first - lower.end_in_first();
    let span_second = upper.start_in_second - lower.end_in_second();
    if options.merge_length > 0
        && (span_first > options.merge_length || span_second > options.merge_length)
    {
        return None;
    }

    let mut end_first = lower.end_in_first();
    let mut end_second = lower.end_in_second();
    loop {
        if upper.start_in_first - end_first <= options.merge_buffer
            && upper.start_in_second - end_second <= options.merge_buffer
        {
            break;
        }

        // Hop onto the nearest bridge that stays between the two matches
        // on both sides and within the buffer of the current chain end.
        let next = bridges.iter().find(|bridge| {
            bridge.start_in_first >= end_first
                && bridge.end_in_first() <= upper.start_in_first
                && bridge.start_in_second >= end_second
                && bridge.end_in_second() <= upper.start_in_second
                && bridge.start_in_first - end_first <= options.merge_buffer
                && bridge.start_in_second - end_second <= options.merge_buffer
        })?;
        end_first = next.end_in_first();
        end_second = next.end_in_second();
    }

    // The covering match carries one length for both sides; take the
    // larger span, clamped so neither side runs past its sequence.
    let covered_first = upper.end_in_first() - lower.start_in_first;
    let covered_second = upper.end_in_second() - lower.start_in_second;
    let length = covered_first
        .max(covered_second)
        .min(comparison.first_token_count - lower.start_in_first)
        .min(comparison.second_token_count - lower.start_in_second);
    Some(Match::new(
        lower.start_in_first,
        lower.start_in_second,
        length,
    ))
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(matches: Vec<Match>, ignored: Vec<Match>) -> Comparison {
        Comparison {
            first_name: "a".into(),
            second_name: "b".into(),
            first_token_count: 200,
            second_token_count: 200,
            matches,
            ignored_matches: ignored,
        }
    }

    #[test]
    fn test_direct_small_gap_is_merged() {
        let input = comparison(vec![Match::new(0, 0, 5), Match::new(7, 7, 5)], vec![]);
        let merged = merge_matches(&input, &MergingOptions::new(2, 0));
        assert_eq!(merged.matches, vec![Match::new(0, 0, 12)]);
    }

    #[test]
    fn test_gap_beyond_buffer_is_not_merged() {
        let input = comparison(vec![Match::new(0, 0, 5), Match::new(9, 9, 5)], vec![]);
        let merged = merge_matches(&input, &MergingOptions::new(2, 0));
        assert_eq!(merged.matches.len(), 2);
    }

    #[test]
    fn test_chain_across_ignored_bridge() {
        let input = comparison(
            vec![Match::new(0, 0, 5), Match::new(10, 10, 5)],
            vec![Match::new(6, 6, 3)],
        );
        let merged = merge_matches(&input, &MergingOptions::new(1, 0));
        assert_eq!(merged.matches, vec![Match::new(0, 0, 15)]);
        assert!(merged.ignored_matches.is_empty(), "used bridges are consumed");
    }

    #[test]
    fn test_chain_across_two_bridges() {
        let input = comparison(
            vec![Match::new(0, 0, 4), Match::new(14, 14, 4)],
            vec![Match::new(5, 5, 3), Match::new(9, 9, 4)],
        );
        let merged = merge_matches(&input, &MergingOptions::new(1, 0));
        assert_eq!(merged.matches, vec![Match::new(0, 0, 18)]);
    }

    #[test]
    fn test_merge_length_caps_the_bridged_span() {
        let input = comparison(
            vec![Match::new(0, 0, 5), Match::new(9, 9, 5)],
            vec![Match::new(6, 6, 2)],
        );
        // Total span between the matches is 4 tokens on each side.
        let capped = merge_matches(&input, &MergingOptions::new(2, 3));
        assert_eq!(capped.matches.len(), 2);

        let allowed = merge_matches(&input, &MergingOptions::new(2, 4));
        assert_eq!(allowed.matches, vec![Match::new(0, 0, 14)]);
    }

    #[test]
    fn test_inconsistent_side_ordering_is_not_merged() {
        // Second match precedes the first on the second side.
        let input = comparison(vec![Match::new(0, 20, 5), Match::new(6, 0, 5)], vec![]);
        let merged = merge_matches(&input, &MergingOptions::new(3, 0));
        assert_eq!(merged.matches.len(), 2);
    }

    #[test]
    fn test_uneven_side_gaps_cover_the_larger_span() {
        let input = comparison(vec![Match::new(0, 0, 5), Match::new(6, 7, 5)], vec![]);
        let merged = merge_matches(&input, &MergingOptions::new(2, 0));
        assert_eq!(merged.matches, vec![Match::new(0, 0, 12)]);
    }

    #[test]
    fn test_zero_buffer_disables_merging() {
        let input = comparison(vec![Match::new(0, 0, 5), Match::new(5, 5, 5)], vec![]);
        let merged = merge_matches(&input, &MergingOptions::default());
        assert_eq!(merged.matches, input.matches);
    }

    #[test]
    fn test_merge_avoids_swallowing_unrelated_matches() {
        // A third match sits inside the would-be merged range on the
        // second side; merging would create an overlap, so it is skipped.
        let input = comparison(
            vec![
                Match::new(0, 0, 5),
                Match::new(7, 30, 5),
                Match::new(40, 6, 5),
            ],
            vec![],
        );
        let merged = merge_matches(&input, &MergingOptions::new(40, 0));
        assert_non_overlapping(&merged.matches);
    }

    #[test]
    fn test_cascading_merges_collapse_a_whole_chain() {
        let input = comparison(
            vec![
                Match::new(0, 0, 4),
                Match::new(5, 5, 4),
                Match::new(10, 10, 4),
            ],
            vec![],
        );
        let merged = merge_matches(&input, &MergingOptions::new(1, 0));
        assert_eq!(merged.matches, vec![Match::new(0, 0, 14)]);
    }

    fn assert_non_overlapping(matches: &[Match]) {
        for (i, a) in matches.iter().enumerate() {
            for b in &matches[i + 1..] {
                assert!(!a.overlaps(b), "matches {:?} and {:?} overlap", a, b);
            }
        }
    }
}
