use crate::core::iupac::{is_compatible, is_gap};
use crate::core::types::Identity;

/// Position-wise identity between a window and the reference.
///
/// Pairs where either symbol is a gap are skipped entirely; every other pair
/// counts towards `compared` and, if the symbols are compatible, towards
/// `matches`. No insertions or deletions are considered.
///
/// Callers pass equal-length slices; extra symbols on the longer side are
/// ignored.
///
/// # Examples
///
/// ```
/// use fasta_filter::matching::scoring::score;
///
/// let identity = score(b"AGG", b"ARG");
/// assert_eq!((identity.matches, identity.compared), (3, 3));
///
/// let identity = score(b"A-GT", b"ACGA");
/// assert_eq!((identity.matches, identity.compared), (2, 3));
/// ```
#[must_use]
pub fn score(window: &[u8], reference: &[u8]) -> Identity {
    let mut identity = Identity::default();

    for (&a, &b) in window.iter().zip(reference) {
        if is_gap(a) || is_gap(b) {
            continue;
        }
        identity.compared += 1;
        if is_compatible(a, b) {
            identity.matches += 1;
        }
    }

    identity
}

/// Identity as a fraction in `[0, 1]`
#[must_use]
pub fn identity_fraction(window: &[u8], reference: &[u8]) -> f64 {
    score(window, reference).fraction()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identical_sequences() {
        assert_eq!(score(b"ACGT", b"ACGT"), Identity::new(4, 4));
        assert!((identity_fraction(b"ACGT", b"ACGT") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ambiguity_in_reference() {
        assert!((identity_fraction(b"AGG", b"ARG") - 1.0).abs() < f64::EPSILON);
        // R={A,G} does not cover C
        assert_eq!(score(b"ACG", b"ARG"), Identity::new(2, 3));
    }

    #[test]
    fn test_gaps_excluded_from_both_counts() {
        assert_eq!(score(b"A-GT", b"ACG-"), Identity::new(2, 2));
        assert_eq!(score(b"AC", b"--"), Identity::new(0, 0));
    }

    #[test]
    fn test_all_gaps_scores_zero() {
        let identity = score(b"---", b"ACG");
        assert_eq!(identity.compared, 0);
        assert!((identity.fraction() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_symbols_count_as_mismatches() {
        assert_eq!(score(b"AXGT", b"AXGT"), Identity::new(3, 4));
    }

    #[test]
    fn test_lowercase_symbols() {
        assert_eq!(score(b"acgt", b"ACGN"), Identity::new(4, 4));
    }

    #[test]
    fn test_empty() {
        assert_eq!(score(b"", b""), Identity::new(0, 0));
    }

    const CANONICAL: &[u8] = b"ACGT";
    const SYMBOLS: &[u8] = b"ACGTRYSWKMBDHVNX-";

    fn canonical(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop::sample::select(CANONICAL), len)
    }

    fn symbols(len: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop::sample::select(SYMBOLS), len)
    }

    proptest! {
        #[test]
        fn self_identity_is_one(seq in canonical(1..60)) {
            prop_assert_eq!(score(&seq, &seq).fraction(), 1.0);
        }

        #[test]
        fn score_is_symmetric((a, b) in (1usize..40).prop_flat_map(|n| (symbols(n), symbols(n)))) {
            prop_assert_eq!(score(&a, &b), score(&b, &a));
        }

        #[test]
        fn fraction_in_unit_interval((a, b) in (0usize..40).prop_flat_map(|n| (symbols(n), symbols(n)))) {
            let f = score(&a, &b).fraction();
            prop_assert!((0.0..=1.0).contains(&f));
        }
    }
}
