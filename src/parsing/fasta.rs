//! Lenient FASTA text parser.
//!
//! The parser accepts free-form text rather than strict FASTA:
//!
//! - Lines end at `\n`, `\r\n` or a bare `\r`, as well as the other Unicode
//!   line boundaries (form feed, vertical tab, `U+0085`, `U+2028`, ...)
//! - Blank lines are skipped and every line is trimmed
//! - A line starting with `>` opens a record named by the rest of the line
//! - Any other line is uppercased (ASCII letters only) and appended to the
//!   open record
//! - Lines before the first header are dropped
//! - A repeated identifier restarts that record's sequence but keeps its
//!   original position
//!
//! Sequence symbols are not validated here; unknown symbols simply never match
//! during scoring.
//!
//! Supported file extensions:
//! - `.fa`, `.fasta`, `.fna`, `.txt` (uncompressed)
//! - the same with `.gz` or `.bgz` (gzip/bgzip compressed)

use std::ffi::OsStr;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::record::{RecordSet, SequenceRecord};
use crate::utils::validation::{check_record_limit, MAX_RECORDS};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input is not valid UTF-8 text: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Too many records: {0} exceeds maximum allowed ({MAX_RECORDS})")]
    TooManyRecords(usize),
}

/// Check if the path has a FASTA (or plain text) extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    let stripped = path_str
        .strip_suffix(".gz")
        .or_else(|| path_str.strip_suffix(".bgz"))
        .unwrap_or(&path_str);

    matches!(
        Path::new(stripped)
            .extension()
            .and_then(OsStr::to_str),
        Some("fa" | "fasta" | "fna" | "txt")
    )
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Check if a character ends a line
const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Parse FASTA-like text into records, in order of first appearance.
///
/// This never fails: malformed content degrades to fewer or shorter records.
/// Uppercasing is ASCII-only; non-ASCII letters are kept as they are and never
/// match.
///
/// # Examples
///
/// ```
/// use fasta_filter::parsing::fasta::parse_records;
///
/// let records = parse_records(">s1\nAC\ngt\n>s2\nTTTT");
/// assert_eq!(records.get("s1").unwrap().sequence, b"ACGT");
/// assert_eq!(records.get("s2").unwrap().sequence, b"TTTT");
/// ```
#[must_use]
pub fn parse_records(text: &str) -> RecordSet {
    let mut records = RecordSet::new();
    // Position of the open record, or None before the first header.
    let mut current: Option<usize> = None;
    let mut accepting = false;
    let mut dropped_lines = 0usize;

    for line in text.split(is_line_break) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            let id = header.trim();
            current = Some(records.insert(SequenceRecord::new(id, Vec::new())));
            // Lines after a header with an empty identifier are not collected.
            accepting = !id.is_empty();
            continue;
        }

        match current.filter(|_| accepting) {
            Some(idx) => {
                if let Some(record) = records.get_index_mut(idx) {
                    record
                        .sequence
                        .extend(line.bytes().map(|b| b.to_ascii_uppercase()));
                }
            }
            None => dropped_lines += 1,
        }
    }

    if dropped_lines > 0 {
        warn!("Dropped {dropped_lines} sequence line(s) without a named header");
    }
    debug!(
        "Parsed {} records ({} symbols)",
        records.len(),
        records.total_length()
    );

    records
}

/// Parse raw bytes (e.g. an upload) as UTF-8 FASTA text.
///
/// # Errors
///
/// Returns `ParseError::InvalidEncoding` if the bytes are not UTF-8 or
/// `ParseError::TooManyRecords` if the record limit is exceeded.
pub fn parse_fasta_bytes(bytes: Vec<u8>) -> Result<RecordSet, ParseError> {
    let text = String::from_utf8(bytes)?;
    let records = parse_records(&text);

    if check_record_limit(records.len()).is_some() {
        return Err(ParseError::TooManyRecords(records.len()));
    }

    Ok(records)
}

/// Read a whole reader as FASTA text.
///
/// # Errors
///
/// Returns `ParseError::Io` if reading fails, plus the errors of
/// [`parse_fasta_bytes`].
pub fn parse_fasta_reader<R: Read>(mut reader: R) -> Result<RecordSet, ParseError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_fasta_bytes(bytes)
}

/// Parse a FASTA file, decompressing `.gz`/`.bgz` input.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read,
/// `ParseError::InvalidEncoding` for non-UTF-8 content, or
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse_fasta_file(path: &Path) -> Result<RecordSet, ParseError> {
    let file = std::fs::File::open(path)?;

    if is_gzipped(path) {
        parse_fasta_reader(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        parse_fasta_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn as_pairs(records: &RecordSet) -> Vec<(String, String)> {
        records
            .iter()
            .map(|r| (r.id.clone(), r.sequence_str().to_string()))
            .collect()
    }

    #[test]
    fn test_wrapped_records() {
        let records = parse_records(">s1\nAC\nGT\n>s2\nTTTT");
        assert_eq!(
            as_pairs(&records),
            vec![
                ("s1".to_string(), "ACGT".to_string()),
                ("s2".to_string(), "TTTT".to_string())
            ]
        );
    }

    #[test]
    fn test_trims_uppercases_and_skips_blank_lines() {
        let records = parse_records(">  sample one  \r\n  acgt \n\n\t\nnnRy\r\n");
        let record = records.get("sample one").unwrap();
        assert_eq!(record.sequence, b"ACGTNNRY");
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let records = parse_records(">s1\rAC\rGT\r>s2\rTTTT\r");
        assert_eq!(
            as_pairs(&records),
            vec![
                ("s1".to_string(), "ACGT".to_string()),
                ("s2".to_string(), "TTTT".to_string())
            ]
        );
    }

    #[test]
    fn test_mixed_and_unicode_line_breaks() {
        let records = parse_records(">a\r\nAC\rgt\n>b\u{2028}CC\x0cGG\u{85}>c\x1eTT");
        assert_eq!(records.get("a").unwrap().sequence, b"ACGT");
        assert_eq!(records.get("b").unwrap().sequence, b"CCGG");
        assert_eq!(records.get("c").unwrap().sequence, b"TT");
    }

    #[test]
    fn test_uppercasing_is_ascii_only() {
        let records = parse_records(">x\nac\u{17f}t\n");
        assert_eq!(records.get("x").unwrap().sequence_str(), "AC\u{17f}T");
    }

    #[test]
    fn test_lines_before_header_are_dropped() {
        let records = parse_records("ACGT\nTTTT\n>s1\nGG\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records.get("s1").unwrap().sequence, b"GG");
    }

    #[test]
    fn test_duplicate_header_restarts_sequence() {
        let records = parse_records(">a\nAAAA\n>b\nCCCC\n>a\nGG\nTT\n");
        assert_eq!(
            as_pairs(&records),
            vec![
                ("a".to_string(), "GGTT".to_string()),
                ("b".to_string(), "CCCC".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_identifier_collects_nothing() {
        let records = parse_records(">\nACGT\n>s1\nGG\n");
        assert_eq!(records.len(), 2);
        assert!(records.get("").unwrap().is_empty());
        assert_eq!(records.get("s1").unwrap().sequence, b"GG");
    }

    #[test]
    fn test_invalid_symbols_pass_through() {
        let records = parse_records(">x\nAC*x.G\n");
        assert_eq!(records.get("x").unwrap().sequence, b"AC*X.G");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("\n\n  \n").is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let result = parse_fasta_bytes(vec![b'>', b'a', b'\n', 0xFF, 0xFE]);
        assert!(matches!(result, Err(ParseError::InvalidEncoding(_))));
    }

    #[test]
    fn test_is_fasta_file() {
        assert!(is_fasta_file(Path::new("reads.fa")));
        assert!(is_fasta_file(Path::new("reads.FASTA")));
        assert!(is_fasta_file(Path::new("reads.txt")));
        assert!(is_fasta_file(Path::new("reads.fna.gz")));
        assert!(is_fasta_file(Path::new("reads.fa.bgz")));
        assert!(!is_fasta_file(Path::new("reads.bam")));
        assert!(!is_fasta_file(Path::new("reads.gz")));
    }

    #[test]
    fn test_parse_plain_file() {
        let mut file = NamedTempFile::with_suffix(".fasta").unwrap();
        writeln!(file, ">r1\nAAGT\nGAAA\n>r2\nCCCC").unwrap();
        file.flush().unwrap();

        let records = parse_fasta_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.get("r1").unwrap().sequence, b"AAGTGAAA");
    }

    #[test]
    fn test_parse_gzipped_file() {
        let mut file = NamedTempFile::with_suffix(".fa.gz").unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">r1\nacgt\n").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let records = parse_fasta_file(file.path()).unwrap();
        assert_eq!(records.get("r1").unwrap().sequence, b"ACGT");
    }

    #[test]
    fn test_missing_file() {
        let result = parse_fasta_file(Path::new("/nonexistent/reads.fa"));
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
