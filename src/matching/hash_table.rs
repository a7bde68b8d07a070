//! Subsequence hash index — rolling hashes over token windows
//!
//! For each submission the matcher precomputes the hash of every window
//! of `window` consecutive token values and buckets the start indices by
//! hash. During tiling, a window in the left sequence is only compared
//! against right-side starts from its own bucket, which turns the
//! quadratic candidate scan into an expected-constant lookup per start.
//!
//! The hash is a rolling polynomial over a Mersenne-prime modulus. All
//! hash values are < 2^61, so `u64::MAX` is safely reserved as the
//! `NO_HASH` sentinel for windows that touch a marked position.

use std::collections::HashMap;

/// Sentinel for windows that contain a marked token. The modulus keeps
/// real hashes strictly below this value.
pub const NO_HASH: u64 = u64::MAX;

const MODULUS: u64 = (1 << 61) - 1;
const BASE: u64 = 1_000_003;

fn mul_mod(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) % MODULUS as u128) as u64
}

fn add_mod(a: u64, b: u64) -> u64 {
    let sum = a as u128 + b as u128;
    (sum % MODULUS as u128) as u64
}

fn sub_mod(a: u64, b: u64) -> u64 {
    add_mod(a, MODULUS - b % MODULUS)
}

/// Per-submission index of window hashes.
#[derive(Debug)]
pub struct SubsequenceHashTable {
    window: usize,
    hash_for_start: Vec<u64>,
    starts_per_hash: HashMap<u64, Vec<usize>>,
}

impl SubsequenceHashTable {
    /// Build the index for a value sequence and its marked-bitmap.
    /// Windows overlapping a marked position receive [`NO_HASH`] and do
    /// not enter any bucket.
    pub fn new(window: usize, values: &[u32], marked: &[bool]) -> Self {
        debug_assert!(window >= 1);
        debug_assert_eq!(values.len(), marked.len());

        if values.len() < window {
            return Self {
                window,
                hash_for_start: Vec::new(),
                starts_per_hash: HashMap::new(),
            };
        }

        let start_count = values.len() - window + 1;
        let mut hash_for_start = vec![NO_HASH; start_count];
        let mut starts_per_hash: HashMap<u64, Vec<usize>> = HashMap::new();

        // base^(window-1), the weight of the outgoing value when rolling.
        let mut leading_weight = 1u64;
        for _ in 1..window {
            leading_weight = mul_mod(leading_weight, BASE);
        }

        let mut hash = 0u64;
        let mut marked_in_window = 0usize;
        for (&value, &is_marked) in values.iter().zip(marked).take(window) {
            hash = add_mod(mul_mod(hash, BASE), value as u64);
            if is_marked {
                marked_in_window += 1;
            }
        }

        for start in 0..start_count {
            if marked_in_window == 0 {
                hash_for_start[start] = hash;
                starts_per_hash.entry(hash).or_default().push(start);
            }
            if start + window < values.len() {
                // Roll: drop values[start], append values[start + window].
                hash = sub_mod(hash, mul_mod(values[start] as u64, leading_weight));
                hash = add_mod(mul_mod(hash, BASE), values[start + window] as u64);
                if marked[start] {
                    marked_in_window -= 1;
                }
                if marked[start + window] {
                    marked_in_window += 1;
                }
            }
        }

        Self {
            window,
            hash_for_start,
            starts_per_hash,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// The hash of the window beginning at `start`, or [`NO_HASH`] when
    /// the window overlaps a marked position or runs past the sequence.
    pub fn hash_for_start(&self, start: usize) -> u64 {
        self.hash_for_start.get(start).copied().unwrap_or(NO_HASH)
    }

    /// All start indices whose window hashes to `hash`, in ascending
    /// order. Empty for unknown hashes and for [`NO_HASH`].
    pub fn starts_with_hash(&self, hash: u64) -> &[usize] {
        self.starts_per_hash
            .get(&hash)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmarked(len: usize) -> Vec<bool> {
        vec![false; len]
    }

    #[test]
    fn test_equal_windows_share_a_bucket() {
        // A B C x A B C
        let values = [1, 2, 3, 9, 1, 2, 3];
        let table = SubsequenceHashTable::new(3, &values, &unmarked(7));

        let hash = table.hash_for_start(0);
        assert_ne!(hash, NO_HASH);
        assert_eq!(table.hash_for_start(4), hash);
        assert_eq!(table.starts_with_hash(hash), &[0, 4]);
    }

    #[test]
    fn test_different_windows_hash_differently() {
        let values = [1, 2, 3, 4, 5];
        let table = SubsequenceHashTable::new(3, &values, &unmarked(5));
        assert_ne!(table.hash_for_start(0), table.hash_for_start(1));
        assert_ne!(table.hash_for_start(1), table.hash_for_start(2));
    }

    #[test]
    fn test_rolling_matches_direct_computation() {
        let values: Vec<u32> = (0..64).map(|i| (i * 7 + 3) % 11).collect();
        let window = 5;
        let rolled = SubsequenceHashTable::new(window, &values, &unmarked(values.len()));

        for start in 0..=values.len() - window {
            let direct = SubsequenceHashTable::new(
                window,
                &values[start..start + window],
                &unmarked(window),
            );
            assert_eq!(
                rolled.hash_for_start(start),
                direct.hash_for_start(0),
                "window at {} disagrees with direct hash",
                start
            );
        }
    }

    #[test]
    fn test_marked_positions_block_their_windows() {
        let values = [1, 2, 3, 4, 5, 6];
        let mut marked = unmarked(6);
        marked[3] = true;
        let table = SubsequenceHashTable::new(3, &values, &marked);

        // Windows at 1, 2, 3 all cover index 3.
        assert_ne!(table.hash_for_start(0), NO_HASH);
        assert_eq!(table.hash_for_start(1), NO_HASH);
        assert_eq!(table.hash_for_start(2), NO_HASH);
        assert_eq!(table.hash_for_start(3), NO_HASH);

        // Blocked windows never enter a bucket.
        let reference = SubsequenceHashTable::new(3, &values, &unmarked(6));
        assert!(table.starts_with_hash(reference.hash_for_start(2)).is_empty());
    }

    #[test]
    fn test_sequence_shorter_than_window_is_empty() {
        let table = SubsequenceHashTable::new(5, &[1, 2, 3], &unmarked(3));
        assert_eq!(table.hash_for_start(0), NO_HASH);
        assert!(table.starts_with_hash(0).is_empty());
    }

    #[test]
    fn test_buckets_are_sorted_ascending() {
        let values = [4, 4, 4, 4, 4, 4, 4];
        let table = SubsequenceHashTable::new(2, &values, &unmarked(7));
        let hash = table.hash_for_start(0);
        let starts = table.starts_with_hash(hash);
        assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(starts.len(), 6);
    }
}
