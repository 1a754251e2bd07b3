//! Centralized validation and helper functions.

/// Maximum number of records allowed in a single input (DOS protection)
pub const MAX_RECORDS: usize = 1_000_000;

/// Maximum reference length accepted from users
pub const MAX_REFERENCE_LENGTH: usize = 10_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const MIN_FILE_CONTENT_SIZE: usize = 1;

/// Magic bytes of a gzip (and bgzip) stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check if the input holds more records than allowed.
///
/// Returns an error message if `count` exceeds the limit, None otherwise.
///
/// # Example
/// ```
/// use fasta_filter::utils::validation::{check_record_limit, MAX_RECORDS};
///
/// assert!(check_record_limit(10).is_none());
/// assert!(check_record_limit(MAX_RECORDS + 1).is_some());
/// ```
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count > MAX_RECORDS {
        Some(format!(
            "Too many records: {count} exceeds maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Reference sequence is empty")]
    EmptyReference,
    #[error("Reference sequence too long: exceeds {MAX_REFERENCE_LENGTH} characters")]
    ReferenceTooLong,
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
    #[error("File content appears malformed or invalid")]
    InvalidFileContent,
}

/// Normalize a user-supplied reference sequence.
///
/// Whitespace anywhere in the input is removed and the rest is uppercased
/// (ASCII letters only; non-ASCII bytes pass through unchanged). Symbols
/// outside the IUPAC alphabet are kept; they never match.
///
/// # Errors
///
/// Returns `ValidationError::EmptyReference` if nothing remains after removing
/// whitespace, or `ValidationError::ReferenceTooLong` above
/// [`MAX_REFERENCE_LENGTH`].
///
/// # Examples
///
/// ```
/// use fasta_filter::utils::validation::validate_reference;
///
/// assert_eq!(validate_reference(" agt g\n").unwrap(), b"AGTG");
/// assert!(validate_reference("   ").is_err());
/// ```
pub fn validate_reference(text: &str) -> Result<Vec<u8>, ValidationError> {
    let reference: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| b.to_ascii_uppercase())
        .collect();

    if reference.is_empty() {
        return Err(ValidationError::EmptyReference);
    }
    if reference.len() > MAX_REFERENCE_LENGTH {
        return Err(ValidationError::ReferenceTooLong);
    }

    Ok(reference)
}

/// Secure filename validation to prevent directory traversal and other attacks
///
/// Validates and sanitizes filenames by:
/// - Checking length limits
/// - Preventing directory traversal (../, ..\\)
/// - Removing potentially dangerous characters
/// - Ensuring filename is not empty after sanitization
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    // Prevent directory traversal attacks
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    // Keep only safe characters
    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_' || *c == ' ')
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // Hidden files only with a known extension
    if sanitized.starts_with('.') && !has_known_extension(&sanitized) {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

/// Check if filename has a known sequence-file extension
fn has_known_extension(filename: &str) -> bool {
    let safe_extensions = [".fa", ".fasta", ".fna", ".txt", ".gz", ".bgz"];

    safe_extensions
        .iter()
        .any(|ext| filename.to_lowercase().ends_with(ext))
}

/// True if the content starts with the gzip magic bytes
#[must_use]
pub fn is_gzip_content(content: &[u8]) -> bool {
    content.starts_with(&GZIP_MAGIC)
}

/// Validate that file content is not malicious or malformed
///
/// Uncompressed content must look like text: valid UTF-8 with few
/// non-printable bytes. Gzip content is only checked for size here and is
/// decoded later.
///
/// # Errors
///
/// Returns `ValidationError::InvalidFileContent` if the content is too small,
/// contains unexpected binary data, or fails UTF-8 validation.
pub fn validate_file_content(content: &[u8]) -> Result<(), ValidationError> {
    if content.len() < MIN_FILE_CONTENT_SIZE {
        return Err(ValidationError::InvalidFileContent);
    }

    if is_gzip_content(content) {
        return Ok(());
    }

    let non_printable_count = content
        .iter()
        .filter(|&&b| b < 9 || (b > 13 && b < 32) || b == 127)
        .count();

    // Allow up to 5% non-printable characters for text files
    if content.len() > 100 && non_printable_count > content.len() / 20 {
        return Err(ValidationError::InvalidFileContent);
    }

    if std::str::from_utf8(content).is_err() {
        return Err(ValidationError::InvalidFileContent);
    }

    Ok(())
}

/// Filename and content checks for an uploaded sequence file
///
/// # Errors
///
/// Returns a `ValidationError` if filename validation or content validation
/// fails.
pub fn validate_upload(
    filename: Option<&str>,
    content: &[u8],
) -> Result<Option<String>, ValidationError> {
    let validated_filename = if let Some(name) = filename {
        Some(validate_filename(name)?)
    } else {
        None
    };

    validate_file_content(content)?;

    Ok(validated_filename)
}
