//! Identity scoring, window search and record filtering.
//!
//! This module provides the matching pipeline:
//!
//! - [`scoring`]: Position-wise identity between two equal-length sequences
//! - [`window`]: Sliding-window search of a reference within one sequence
//! - [`filter`]: [`FilterEngine`] applies the search to a whole [`RecordSet`]
//!
//! ## Identity
//!
//! Two symbols match when the base sets they represent overlap (see
//! [`crate::core::iupac`]). Positions where either side is a gap `-` are left
//! out of both the numerator and the denominator. A window with no compared
//! positions has identity 0.
//!
//! ## Example
//!
//! ```rust
//! use fasta_filter::{FilterConfig, FilterEngine, SelectionPolicy};
//! use fasta_filter::parsing::fasta::parse_records;
//!
//! let records = parse_records(">x\nAAGTGAAA\n>y\nTTTTTTTT\n");
//! let config = FilterConfig {
//!     threshold: 1.0,
//!     policy: SelectionPolicy::BestScoring,
//!     ..FilterConfig::default()
//! };
//!
//! let outcome = FilterEngine::new(config).filter(&records, b"AGTG");
//! assert_eq!(outcome.to_fasta_text(), ">x\nAGTG\n");
//! assert_eq!(outcome.unmatched, vec!["y".to_string()]);
//! ```
//!
//! [`RecordSet`]: crate::core::RecordSet

pub mod filter;
pub mod scoring;
pub mod window;

pub use filter::{FilterConfig, FilterEngine, FilterOutcome, MatchedRecord};
