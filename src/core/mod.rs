//! Core data types for ambiguity-aware sequence filtering.
//!
//! - [`iupac`]: The IUPAC ambiguity table and base compatibility test
//! - [`SequenceRecord`], [`RecordSet`]: Parsed FASTA records in input order
//! - [`Identity`], [`WindowMatch`], [`SelectionPolicy`]: Scoring and search results
//!
//! ## Symbols
//!
//! Sequences are byte strings of single-letter nucleotide codes. Canonical
//! bases, IUPAC ambiguity codes and the gap marker `-` are understood; any
//! other byte is carried through unchanged and never matches.

pub mod iupac;
pub mod record;
pub mod types;

pub use record::{RecordSet, SequenceRecord};
pub use types::{Identity, SelectionPolicy, WindowMatch};
