//! Quality scoring: a weighted completeness/length heuristic in `[0, 1]`.
//!
//! | Component | Points |
//! |-----------|--------|
//! | base | 0.40 |
//! | abstract present | +0.15 |
//! | references present | +0.15 |
//! | ≥ 5000 / ≥ 2000 / ≥ 1000 words | +0.20 / +0.15 / +0.10 |
//! | tables or figures present | +0.10 |
//!
//! Weights are summed in hundredths so the two-decimal result is exact.

use crate::output::DocumentMetadata;

const BASE: u32 = 40;
const ABSTRACT: u32 = 15;
const REFERENCES: u32 = 15;
const RICHNESS: u32 = 10;

/// Word-count buckets, largest first.
const LENGTH_BUCKETS: [(usize, u32); 3] = [(5000, 20), (2000, 15), (1000, 10)];

/// Score a metadata record.
pub fn assess_quality(metadata: &DocumentMetadata) -> f64 {
    score(
        metadata.has_abstract,
        metadata.has_references,
        metadata.has_tables || metadata.has_figures,
        metadata.word_count,
    )
}

/// Score from the raw inputs.
pub fn score(has_abstract: bool, has_references: bool, rich: bool, word_count: usize) -> f64 {
    let mut points = BASE;
    if has_abstract {
        points += ABSTRACT;
    }
    if has_references {
        points += REFERENCES;
    }
    points += LENGTH_BUCKETS
        .iter()
        .find(|(min_words, _)| word_count >= *min_words)
        .map_or(0, |(_, p)| *p);
    if rich {
        points += RICHNESS;
    }
    f64::from(points.min(100)) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_only() {
        assert_eq!(score(false, false, false, 0), 0.40);
        assert_eq!(score(false, false, false, 999), 0.40);
    }

    #[test]
    fn length_buckets() {
        assert_eq!(score(false, false, false, 1000), 0.50);
        assert_eq!(score(false, false, false, 2000), 0.55);
        assert_eq!(score(false, false, false, 5000), 0.60);
    }

    #[test]
    fn full_paper_without_tables() {
        assert_eq!(score(true, true, false, 6000), 0.90);
    }

    #[test]
    fn maximum_is_exactly_one() {
        assert_eq!(score(true, true, true, 1_000_000), 1.0);
    }

    #[test]
    fn monotone_in_flags_and_length() {
        let words = [0, 999, 1000, 1999, 2000, 4999, 5000, 50_000];
        let mut prev_len = 0.0;
        for w in words {
            let s = score(false, false, false, w);
            assert!(s >= prev_len, "non-monotone at {w}");
            prev_len = s;
            for flags in 0u8..8 {
                let a = flags & 1 != 0;
                let r = flags & 2 != 0;
                let t = flags & 4 != 0;
                let s = score(a, r, t, w);
                assert!((0.0..=1.0).contains(&s));
                assert!(score(true, r, t, w) >= s);
                assert!(score(a, true, t, w) >= s);
                assert!(score(a, r, true, w) >= s);
            }
        }
    }
}
