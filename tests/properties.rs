//! Invariants of the matcher and the normalizer, exercised over a
//! bank of letter streams.

mod common;

use common::{letter_tokens, letters, statement, type_names};
use tessera::{normalize_tokens, Match, Submission, TilingMatcher, Token};

const STREAMS: [&str; 6] = [
    "ABCDEFGHIJ",
    "ABCABCABCABC",
    "XYZABCDEFGXYZ",
    "QWERTYUIOP",
    "AAAABBBBCCCC",
    "ABCDXYZABCD",
];

fn stream_pairs() -> Vec<(Submission, Submission)> {
    let mut pairs = Vec::new();
    for (i, a) in STREAMS.iter().enumerate() {
        for b in &STREAMS[i..] {
            pairs.push((letters("first", a), letters("second", b)));
        }
    }
    pairs
}

fn assert_non_overlapping(matches: &[Match]) {
    for (i, a) in matches.iter().enumerate() {
        for b in &matches[i + 1..] {
            assert!(!a.overlaps(b), "matches {:?} and {:?} overlap", a, b);
        }
    }
}

#[test]
fn matches_never_overlap_and_never_exceed_the_shorter_stream() {
    let matcher = TilingMatcher::new(3, 0);
    for (a, b) in stream_pairs() {
        let comparison = matcher.compare(&a, &b);
        assert_non_overlapping(&comparison.matches);
        let matched: usize = comparison.matches.iter().map(|m| m.length).sum();
        assert!(
            matched <= a.comparable_tokens().min(b.comparable_tokens()),
            "{} matched tokens exceed the shorter stream for {:?}/{:?}",
            matched,
            a.name(),
            b.name(),
        );
    }
}

#[test]
fn every_match_reaches_the_minimum_token_match() {
    let matcher = TilingMatcher::new(4, 0);
    for (a, b) in stream_pairs() {
        for matched in matcher.compare(&a, &b).matches {
            assert!(matched.length >= 4, "undersized match {:?}", matched);
        }
    }
}

#[test]
fn self_comparison_matches_everything_but_the_sentinel() {
    let matcher = TilingMatcher::new(3, 0);
    for stream in STREAMS {
        let submission = letters("self", stream);
        let comparison = matcher.compare(&submission, &submission);
        assert_eq!(comparison.matches.len(), 1, "stream {:?}", stream);
        assert_eq!(comparison.matches[0].length, submission.token_count() - 1);
    }
}

#[test]
fn comparison_is_symmetric_in_its_argument_order() {
    let matcher = TilingMatcher::new(3, 0);
    for (a, b) in stream_pairs() {
        let ab = matcher.compare(&a, &b);
        let ba = matcher.compare(&b, &a);
        assert_eq!(ab.first_name, ba.first_name);
        assert_eq!(ab.second_name, ba.second_name);
        assert_eq!(ab.matches, ba.matches);
        assert_eq!(ab.ignored_matches, ba.ignored_matches);
    }
}

#[test]
fn repeated_comparisons_are_identical_even_in_parallel() {
    use rayon::prelude::*;

    let matcher = TilingMatcher::new(3, 0);
    let a = letters("a", "ABCDXYZABCDQQABCD");
    let b = letters("b", "ABCDQQABCDXYZ");

    let baseline = matcher.compare(&a, &b);
    let repeats: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| matcher.compare(&a, &b))
        .collect();
    for repeat in repeats {
        assert_eq!(repeat.matches, baseline.matches);
        assert_eq!(repeat.ignored_matches, baseline.ignored_matches);
    }
}

#[test]
fn base_code_marking_twice_equals_marking_once() {
    let build = || {
        (
            letters("a", "ABCDEFGHIJ"),
            letters("b", "ABCDEFGHIJ"),
            letters("base", "DEF"),
        )
    };

    let (a1, b1, base1) = build();
    let once = TilingMatcher::new(3, 0);
    once.generate_base_code_marking(&a1, &base1);
    once.generate_base_code_marking(&b1, &base1);
    let single = once.compare(&a1, &b1);

    let (a2, b2, base2) = build();
    let twice = TilingMatcher::new(3, 0);
    twice.generate_base_code_marking(&a2, &base2);
    twice.generate_base_code_marking(&a2, &base2);
    twice.generate_base_code_marking(&b2, &base2);
    twice.generate_base_code_marking(&b2, &base2);
    let double = twice.compare(&a2, &b2);

    assert_eq!(
        single.matches.iter().map(|m| m.length).collect::<Vec<_>>(),
        double.matches.iter().map(|m| m.length).collect::<Vec<_>>(),
    );
}

// ─── Normalization invariants ───────────────────────────────────────

fn live_program() -> Vec<Token> {
    vec![
        statement("ASSIGN", 0, 1, false, &[], &["x"]),
        statement("COPY", 1, 2, false, &["x"], &["y"]),
        statement("PRINT", 2, 3, true, &["y"], &[]),
        Token::file_end("f.x"),
    ]
}

#[test]
fn normalization_is_idempotent() {
    let once = normalize_tokens(live_program());
    let twice = normalize_tokens(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn normalization_ignores_independent_insertions() {
    let baseline = normalize_tokens(live_program());
    for position in 0..3 {
        let mut padded = live_program();
        padded.insert(position, statement("ASSIGN", 0, 20, false, &[], &["noise"]));
        assert_eq!(
            type_names(&normalize_tokens(padded)),
            type_names(&baseline),
            "insertion at statement {} leaked into the normalized stream",
            position,
        );
    }
}

#[test]
fn normalization_ignores_independent_reordering() {
    let forward = vec![
        statement("ASSIGN", 0, 1, false, &[], &["a"]),
        statement("PRINT", 2, 2, true, &["a"], &[]),
        statement("INCR", 1, 3, false, &[], &["b"]),
        statement("SEND", 3, 4, true, &["b"], &[]),
        Token::file_end("f.x"),
    ];
    let swapped = vec![
        forward[2].clone(),
        forward[3].clone(),
        forward[0].clone(),
        forward[1].clone(),
        Token::file_end("f.x"),
    ];

    assert_eq!(
        type_names(&normalize_tokens(forward)),
        type_names(&normalize_tokens(swapped)),
    );
}

#[test]
fn normalized_streams_still_carry_the_sentinel() {
    let normalized = normalize_tokens(letter_tokens("ABC"));
    assert_eq!(
        normalized.last().unwrap().token_type,
        tessera::TokenType::FileEnd,
    );
}
