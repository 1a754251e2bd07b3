//! Sliding-window search of a reference within a longer sequence.
//!
//! Every reference-length window is scored with [`score`] in increasing
//! offset order. Which window is reported depends on the [`SelectionPolicy`]:
//!
//! - **first-qualifying**: the lowest offset whose identity meets the
//!   threshold; scanning stops there
//! - **best-scoring**: the highest identity among qualifying windows, ties
//!   resolved to the lowest offset
//!
//! The threshold is inclusive under both policies.

use crate::core::types::{Identity, SelectionPolicy, WindowMatch};
use crate::matching::scoring::score;

/// Number of reference-length windows in a sequence (0 if the reference is longer)
#[must_use]
pub fn window_count(sequence_len: usize, reference_len: usize) -> usize {
    (sequence_len + 1).saturating_sub(reference_len)
}

/// Iterate over `(offset, identity)` for every window, in offset order
fn scored_windows<'a>(
    sequence: &'a [u8],
    reference: &'a [u8],
) -> impl Iterator<Item = (usize, Identity)> + 'a {
    sequence
        .windows(reference.len())
        .enumerate()
        .map(move |(offset, window)| (offset, score(window, reference)))
}

fn to_match(
    sequence: &[u8],
    reference_len: usize,
    offset: usize,
    identity: Identity,
) -> WindowMatch {
    WindowMatch {
        offset,
        window: sequence[offset..offset + reference_len].to_vec(),
        identity,
    }
}

/// Find the window of `sequence` selected by `policy` for `reference`.
///
/// Returns `None` when the reference is empty, when it is longer than the
/// sequence, or when no window reaches `threshold`.
///
/// # Examples
///
/// ```
/// use fasta_filter::core::types::SelectionPolicy;
/// use fasta_filter::matching::window::search;
///
/// let hit = search(b"AAGTGAAA", b"AGTG", 1.0, SelectionPolicy::FirstQualifying).unwrap();
/// assert_eq!(hit.offset, 1);
/// assert_eq!(hit.window, b"AGTG");
/// ```
#[must_use]
pub fn search(
    sequence: &[u8],
    reference: &[u8],
    threshold: f64,
    policy: SelectionPolicy,
) -> Option<WindowMatch> {
    match policy {
        SelectionPolicy::FirstQualifying => search_first(sequence, reference, threshold),
        SelectionPolicy::BestScoring => search_best(sequence, reference, threshold),
    }
}

/// Lowest-offset window whose identity is at least `threshold`
#[must_use]
pub fn search_first(sequence: &[u8], reference: &[u8], threshold: f64) -> Option<WindowMatch> {
    if reference.is_empty() || reference.len() > sequence.len() {
        return None;
    }

    scored_windows(sequence, reference)
        .find(|(_, identity)| identity.meets(threshold))
        .map(|(offset, identity)| to_match(sequence, reference.len(), offset, identity))
}

/// Highest-identity window among those meeting `threshold`; ties keep the lowest offset
#[must_use]
pub fn search_best(sequence: &[u8], reference: &[u8], threshold: f64) -> Option<WindowMatch> {
    if reference.is_empty() || reference.len() > sequence.len() {
        return None;
    }

    let mut best: Option<(usize, Identity, f64)> = None;
    for (offset, identity) in scored_windows(sequence, reference) {
        let fraction = identity.fraction();
        if fraction < threshold {
            continue;
        }
        // Only a strictly greater score replaces the current best.
        if best.map_or(true, |(_, _, best_fraction)| fraction > best_fraction) {
            best = Some((offset, identity, fraction));
        }
    }

    best.map(|(offset, identity, _)| to_match(sequence, reference.len(), offset, identity))
}
