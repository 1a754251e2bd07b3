//! IUPAC nucleotide ambiguity table and base compatibility.
//!
//! Every symbol resolves to the set of concrete bases it can stand for:
//!
//! | Symbol | Bases   | Symbol | Bases   |
//! |--------|---------|--------|---------|
//! | A      | A       | K      | G, T    |
//! | C      | C       | M      | A, C    |
//! | G      | G       | B      | C, G, T |
//! | T      | T       | D      | A, G, T |
//! | R      | A, G    | H      | A, C, T |
//! | Y      | C, T    | V      | A, C, G |
//! | S      | C, G    | N      | A, C, G, T |
//! | W      | A, T    | -      | (none)  |
//!
//! Any other symbol resolves to the empty set, so it never matches anything,
//! not even an identical symbol.

use std::fmt;

/// The gap ("no call") marker
pub const GAP: u8 = b'-';

/// Concrete bases in display order
const CANONICAL: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// A set of concrete bases stored as a 4-bit mask (A=1, C=2, G=4, T=8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BaseSet(u8);

impl BaseSet {
    pub const EMPTY: Self = Self(0);
    pub const A: Self = Self(0b0001);
    pub const C: Self = Self(0b0010);
    pub const G: Self = Self(0b0100);
    pub const T: Self = Self(0b1000);

    const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bases present in both sets
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if both sets share at least one base
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if `base` (case-insensitive) is one of the concrete bases in this set
    #[must_use]
    pub const fn contains(self, base: u8) -> bool {
        match base.to_ascii_uppercase() {
            b'A' | b'C' | b'G' | b'T' => self.intersects(bases_of(base)),
            _ => false,
        }
    }

    /// Concrete bases in A, C, G, T order
    pub fn bases(self) -> impl Iterator<Item = u8> {
        CANONICAL.into_iter().filter(move |&b| self.contains(b))
    }
}

impl fmt::Display for BaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, base) in self.bases().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", base as char)?;
        }
        write!(f, "}}")
    }
}

/// Resolve a nucleotide symbol (case-insensitive) to the bases it represents.
///
/// The gap marker and any symbol outside the IUPAC nucleotide alphabet resolve
/// to [`BaseSet::EMPTY`].
///
/// # Examples
///
/// ```
/// use fasta_filter::core::iupac::{bases_of, BaseSet};
///
/// assert_eq!(bases_of(b'r').to_string(), "{A,G}");
/// assert!(bases_of(b'-').is_empty());
/// assert_eq!(bases_of(b'X'), BaseSet::EMPTY);
/// ```
#[must_use]
pub const fn bases_of(symbol: u8) -> BaseSet {
    use BaseSet as B;
    match symbol.to_ascii_uppercase() {
        b'A' => B::A,
        b'C' => B::C,
        b'G' => B::G,
        b'T' => B::T,
        b'R' => B::A.union(B::G),
        b'Y' => B::C.union(B::T),
        b'S' => B::G.union(B::C),
        b'W' => B::A.union(B::T),
        b'K' => B::G.union(B::T),
        b'M' => B::A.union(B::C),
        b'B' => B::C.union(B::G).union(B::T),
        b'D' => B::A.union(B::G).union(B::T),
        b'H' => B::A.union(B::C).union(B::T),
        b'V' => B::A.union(B::C).union(B::G),
        b'N' => B::A.union(B::C).union(B::G).union(B::T),
        _ => B::EMPTY,
    }
}

/// Two symbols are compatible when the base sets they represent overlap.
///
/// Symmetric. Gaps are never compatible, and neither is an unrecognized symbol,
/// even with itself.
///
/// # Examples
///
/// ```
/// use fasta_filter::core::iupac::is_compatible;
///
/// assert!(is_compatible(b'R', b'G'));
/// assert!(is_compatible(b'Y', b'B'));
/// assert!(!is_compatible(b'R', b'Y'));
/// assert!(!is_compatible(b'-', b'-'));
/// assert!(!is_compatible(b'X', b'X'));
/// ```
#[inline]
#[must_use]
pub const fn is_compatible(a: u8, b: u8) -> bool {
    bases_of(a).intersects(bases_of(b))
}

#[inline]
#[must_use]
pub const fn is_gap(symbol: u8) -> bool {
    symbol == GAP
}

/// True for the gap marker and every symbol of the IUPAC nucleotide alphabet
#[must_use]
pub const fn is_recognized(symbol: u8) -> bool {
    is_gap(symbol) || !bases_of(symbol).is_empty()
}
