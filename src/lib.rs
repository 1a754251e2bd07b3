//! # fasta-filter
//!
//! A library for finding reference-like windows inside FASTA records.
//!
//! Given a set of records and a short reference sequence, every record is
//! scanned with a window as long as the reference. A window's identity is the
//! fraction of compared positions whose symbols are compatible, where IUPAC
//! ambiguity codes match any base they stand for and gap positions (`-`) are
//! not compared. Records with a window at or above the threshold are kept,
//! and the kept windows can be written out as FASTA.
//!
//! ## Features
//!
//! - **IUPAC-aware matching**: `R` matches `A` and `G`, `N` matches anything
//! - **Gap-tolerant identity**: gap positions are left out of the score
//! - **Two selection policies**: first qualifying window or best-scoring window
//! - **Lenient parsing**: free-form FASTA text, plain or gzip compressed
//! - **Parallel search**: records are searched concurrently, output keeps input order
//!
//! ## Example
//!
//! ```rust
//! use fasta_filter::{parse_records, FilterConfig, FilterEngine};
//!
//! let records = parse_records(">x\nAAGT\nGAAA\n>y\nTTTTTTTT\n");
//! let engine = FilterEngine::new(FilterConfig {
//!     threshold: 1.0,
//!     ..FilterConfig::default()
//! });
//!
//! let outcome = engine.filter(&records, b"AGTG");
//! for m in &outcome.matched {
//!     println!("{} @ {}: {:.1}%", m.id, m.hit.offset, m.hit.identity.fraction() * 100.0);
//! }
//! assert_eq!(outcome.to_fasta_text(), ">x\nAGTG\n");
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Ambiguity table, records and result types
//! - [`matching`]: Identity scoring, window search and filtering
//! - [`parsing`]: FASTA text parser
//! - [`utils`]: Input validation and limits
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: Web server for browser-based filtering

pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use crate::core::record::{RecordSet, SequenceRecord};
pub use crate::core::types::*;
pub use matching::filter::{
    to_fasta_text, FilterConfig, FilterEngine, FilterOutcome, MatchedRecord,
};
pub use parsing::fasta::parse_records;
