//! Parsers for turning raw input into sequence records.
//!
//! Only FASTA-like text is understood (optionally gzip/bgzip compressed).
//! The parser is deliberately lenient; see [`fasta`] for the exact rules.
//!
//! ## Example
//!
//! ```rust
//! use fasta_filter::parsing::fasta::parse_records;
//!
//! let records = parse_records(">read1\nAAGT\nGAAA\n>read2\nCCCC\n");
//! assert_eq!(records.len(), 2);
//! assert_eq!(records.get("read1").unwrap().sequence, b"AAGTGAAA");
//! ```

pub mod fasta;

pub use fasta::{parse_fasta_file, parse_records, ParseError};
