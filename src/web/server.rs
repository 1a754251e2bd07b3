use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use flate2::read::MultiGzDecoder;
use serde::Serialize;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::cli::ServeArgs;
use crate::core::record::RecordSet;
use crate::core::types::SelectionPolicy;
use crate::matching::filter::{FilterConfig, FilterEngine, FilterOutcome, DEFAULT_OUTPUT_NAME};
use crate::parsing::fasta::{parse_fasta_bytes, parse_records, ParseError};
use crate::utils::validation::{
    check_record_limit, is_gzip_content, validate_reference, validate_upload, ValidationError,
};

/// Security configuration constants to prevent `DoS` attacks
pub const MAX_MULTIPART_FIELDS: usize = 10;
pub const MAX_FILE_FIELD_SIZE: usize = 16 * 1024 * 1024; // 16MB
pub const MAX_TEXT_FIELD_SIZE: usize = 1024 * 1024; // 1MB

/// Largest decompressed size accepted for gzip uploads
pub const MAX_DECOMPRESSED_SIZE: u64 = 256 * 1024 * 1024; // 256MB

/// Shared application state
pub struct AppState {
    /// Defaults for every request; threshold and policy are overridden per request
    pub base_config: FilterConfig,
}

/// Input data extracted from multipart form
#[derive(Debug, Default)]
struct InputData {
    /// Pasted FASTA text
    sequence_text: Option<String>,
    /// Uploaded file content (plain or gzip)
    file_content: Option<Vec<u8>>,
    /// Validated upload filename
    filename: Option<String>,
    /// Raw reference text, normalized later
    reference: Option<String>,
}

/// Enhanced error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    // Log detailed error server-side for debugging (not exposed to client)
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None, // Never expose internal details to prevent information disclosure
    }
}

fn error_response(
    status: StatusCode,
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> Response {
    (
        status,
        Json(create_safe_error_response(
            error_type,
            user_message,
            internal_error,
        )),
    )
        .into_response()
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    // Build tokio runtime
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args).await })
}

/// Application routes without middleware.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/filter", post(filter_handler))
        .with_state(state)
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is rejected.
pub fn create_router() -> anyhow::Result<Router> {
    let state = Arc::new(AppState {
        base_config: FilterConfig::default(),
    });

    // Configure IP-based rate limiting
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10) // 10 requests per second per IP
        .burst_size(50) // Allow bursts of 50 requests
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?;

    // Build router with comprehensive security layers
    let app = routes(state).layer(
        ServiceBuilder::new()
            // Security headers for browser protection
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-xss-protection"),
                HeaderValue::from_static("1; mode=block"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("strict-transport-security"),
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            // IP-based rate limiting to prevent abuse
            .layer(GovernorLayer {
                config: Arc::new(governor_conf),
            })
            // Request timeout to prevent slow client attacks
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(30),
            ))
            // Limit concurrent requests to prevent DOS
            .layer(ConcurrencyLimitLayer::new(100))
            // Limit request body size (largest file + multipart overhead)
            .layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB limit
    );

    Ok(app)
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let app = create_router()?;

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting fasta-filter web server at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Main page handler
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("templates/index.html"))
}

/// API endpoint for filtering records against a reference
async fn filter_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let start_time = std::time::Instant::now();

    let (input_data, config) = match extract_request_data(&mut multipart, &state.base_config).await
    {
        Ok(data) => data,
        Err(response) => return response,
    };

    let reference = match validate_reference(input_data.reference.as_deref().unwrap_or_default()) {
        Ok(reference) => reference,
        Err(ValidationError::ReferenceTooLong) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "reference_too_long",
                "Reference sequence exceeds maximum length limit",
                None,
            );
        }
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "missing_reference",
                "Please enter a reference sequence.",
                None,
            );
        }
    };

    let records = match parse_input_data(&input_data) {
        Ok(records) => records,
        Err(response) => return *response,
    };

    // The search is CPU-bound; keep it off the async workers
    let search_config = config.clone();
    let search = tokio::task::spawn_blocking(move || {
        FilterEngine::new(search_config).filter(&records, &reference)
    })
    .await;

    let outcome = match search {
        Ok(outcome) => outcome,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Filtering failed. Please try again.",
                Some(e.to_string().as_str()),
            );
        }
    };

    #[allow(clippy::cast_possible_truncation)] // Processing time won't exceed u64
    let processing_time = start_time.elapsed().as_millis() as u64;

    Json(build_response(
        &outcome,
        &config,
        input_data.filename.as_deref(),
        processing_time,
    ))
    .into_response()
}

fn build_response(
    outcome: &FilterOutcome,
    config: &FilterConfig,
    filename: Option<&str>,
    processing_time: u64,
) -> serde_json::Value {
    let matches: Vec<serde_json::Value> = outcome
        .matched
        .iter()
        .map(|m| {
            serde_json::json!({
                "id": m.id,
                "offset": m.hit.offset,
                "window": m.hit.window_str(),
                "identity": m.hit.identity.fraction(),
                "matches": m.hit.identity.matches,
                "compared": m.hit.identity.compared,
            })
        })
        .collect();

    serde_json::json!({
        "records_loaded": outcome.total,
        "matched_count": outcome.matched_count(),
        "matches": matches,
        "unmatched": outcome.unmatched,
        "fasta": outcome.to_fasta_text(),
        "download_name": DEFAULT_OUTPUT_NAME,
        "processing_time_ms": processing_time,
        "configuration": {
            "threshold": config.threshold,
            "policy": config.policy,
            "filename": filename,
        }
    })
}

/// Extract input data and configuration from multipart form
#[allow(clippy::too_many_lines)]
async fn extract_request_data(
    multipart: &mut Multipart,
    base_config: &FilterConfig,
) -> Result<(InputData, FilterConfig), Response> {
    let mut input_data = InputData::default();
    let mut config = base_config.clone();

    let mut fields_received = 0usize;
    let mut had_parse_error = false;

    // Process multipart fields
    loop {
        // Check field count limit before processing
        if fields_received >= MAX_MULTIPART_FIELDS {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "field_limit_exceeded",
                "Too many form fields",
                None,
            ));
        }

        match multipart.next_field().await {
            Ok(Some(field)) => {
                fields_received += 1;
                let name = field.name().unwrap_or_default().to_string();

                match name.as_str() {
                    "file" => {
                        let filename = field
                            .file_name()
                            .filter(|n| !n.is_empty())
                            .map(std::string::ToString::to_string);

                        match field.bytes().await {
                            // Browsers send an empty part when no file was chosen
                            Ok(bytes) if bytes.is_empty() && filename.is_none() => {}
                            Ok(bytes) => {
                                if bytes.len() > MAX_FILE_FIELD_SIZE {
                                    return Err(error_response(
                                        StatusCode::PAYLOAD_TOO_LARGE,
                                        "file_too_large",
                                        "File size exceeds limit",
                                        None,
                                    ));
                                }

                                match validate_upload(filename.as_deref(), &bytes) {
                                    Ok(validated_filename) => {
                                        input_data.filename = validated_filename;
                                        input_data.file_content = Some(bytes.to_vec());
                                    }
                                    Err(e) => return Err(upload_error_response(&e)),
                                }
                            }
                            Err(_) => had_parse_error = true,
                        }
                    }
                    "sequence_text" => match field.text().await {
                        Ok(text) => {
                            if text.len() > MAX_TEXT_FIELD_SIZE {
                                return Err(error_response(
                                    StatusCode::PAYLOAD_TOO_LARGE,
                                    "text_too_large",
                                    "Text field size exceeds limit",
                                    None,
                                ));
                            }

                            if !text.trim().is_empty() {
                                input_data.sequence_text = Some(text);
                            }
                        }
                        Err(_) => had_parse_error = true,
                    },
                    "reference" => match field.text().await {
                        Ok(text) => {
                            if text.len() > MAX_TEXT_FIELD_SIZE {
                                return Err(error_response(
                                    StatusCode::PAYLOAD_TOO_LARGE,
                                    "text_too_large",
                                    "Text field size exceeds limit",
                                    None,
                                ));
                            }
                            input_data.reference = Some(text);
                        }
                        Err(_) => had_parse_error = true,
                    },
                    "threshold" => {
                        // Percent; out-of-range values are clamped
                        if let Ok(text) = field.text().await {
                            if let Ok(percent) = text.trim().parse::<f64>() {
                                if percent.is_finite() {
                                    config.threshold = percent.clamp(0.0, 100.0) / 100.0;
                                }
                            }
                        }
                    }
                    "policy" => {
                        if let Ok(text) = field.text().await {
                            match text.parse::<SelectionPolicy>() {
                                Ok(policy) => config.policy = policy,
                                Err(e) => {
                                    return Err(error_response(
                                        StatusCode::BAD_REQUEST,
                                        "invalid_policy",
                                        "Unknown selection policy. Use first-qualifying or best-scoring.",
                                        Some(e.as_str()),
                                    ));
                                }
                            }
                        }
                    }
                    _ => {} // Ignore unknown fields
                }
            }
            Ok(None) => break, // No more fields
            Err(_) => {
                had_parse_error = true;
                break;
            }
        }
    }

    // Validate that we have some input
    if input_data.sequence_text.is_none() && input_data.file_content.is_none() {
        let error_msg = if had_parse_error {
            "Failed to parse upload. Please check the file format."
        } else if fields_received == 0 {
            "No data received. Please upload a file or paste FASTA text."
        } else {
            "No FASTA data found in upload."
        };

        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing_input",
            error_msg,
            None,
        ));
    }

    Ok((input_data, config))
}

fn upload_error_response(error: &ValidationError) -> Response {
    match error {
        ValidationError::FilenameTooLong => error_response(
            StatusCode::BAD_REQUEST,
            "filename_too_long",
            "Filename exceeds maximum length limit",
            Some("Filename validation failed due to length constraints"),
        ),
        ValidationError::InvalidFilename | ValidationError::EmptyFilename => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_filename",
            "Filename contains invalid or dangerous characters",
            Some("Filename validation failed due to invalid characters"),
        ),
        ValidationError::InvalidFileContent => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_content",
            "File content appears malformed or corrupted",
            None,
        ),
        _ => error_response(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            "File validation failed",
            None,
        ),
    }
}

/// Parse the upload (preferred) or the pasted text into records
fn parse_input_data(input_data: &InputData) -> Result<RecordSet, Box<Response>> {
    if let Some(content) = &input_data.file_content {
        let bytes = if is_gzip_content(content) {
            decompress_upload(content)?
        } else {
            content.clone()
        };

        return parse_fasta_bytes(bytes).map_err(|e| Box::new(parse_error_response(&e)));
    }

    if let Some(text) = &input_data.sequence_text {
        let records = parse_records(text);
        if let Some(message) = check_record_limit(records.len()) {
            return Err(Box::new(error_response(
                StatusCode::BAD_REQUEST,
                "too_many_records",
                &message,
                None,
            )));
        }
        return Ok(records);
    }

    Err(Box::new(
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal error: no input data".to_string(),
                error_type: "internal_error".to_string(),
                details: None,
            }),
        )
            .into_response(),
    ))
}

/// Inflate a gzip upload, refusing output beyond [`MAX_DECOMPRESSED_SIZE`]
fn decompress_upload(content: &[u8]) -> Result<Vec<u8>, Box<Response>> {
    let mut decoded = Vec::new();
    let read = MultiGzDecoder::new(content)
        .take(MAX_DECOMPRESSED_SIZE + 1)
        .read_to_end(&mut decoded);

    if let Err(e) = read {
        return Err(Box::new(error_response(
            StatusCode::BAD_REQUEST,
            "decompression_failed",
            "Unable to decompress the uploaded file.",
            Some(e.to_string().as_str()),
        )));
    }
    if decoded.len() as u64 > MAX_DECOMPRESSED_SIZE {
        return Err(Box::new(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "file_too_large",
            "Decompressed file size exceeds limit",
            None,
        )));
    }

    Ok(decoded)
}

fn parse_error_response(error: &ParseError) -> Response {
    match error {
        ParseError::InvalidEncoding(_) => error_response(
            StatusCode::BAD_REQUEST,
            "invalid_content",
            "File content is not valid UTF-8 text",
            None,
        ),
        ParseError::TooManyRecords(_) => error_response(
            StatusCode::BAD_REQUEST,
            "too_many_records",
            &error.to_string(),
            None,
        ),
        ParseError::Io(e) => error_response(
            StatusCode::BAD_REQUEST,
            "parse_failed",
            "Unable to process file content. Please check the file and try again.",
            Some(e.to_string().as_str()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tower::ServiceExt;

    const BOUNDARY: &str = "fastafilterboundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(filename, content) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(content);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_filter(parts: &[Part<'_>]) -> (StatusCode, serde_json::Value) {
        let app = routes(Arc::new(AppState {
            base_config: FilterConfig::default(),
        }));
        let request = Request::builder()
            .method("POST")
            .uri("/api/filter")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index_page() {
        let app = routes(Arc::new(AppState {
            base_config: FilterConfig::default(),
        }));
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("/api/filter"));
    }

    #[tokio::test]
    async fn test_filter_pasted_text() {
        let (status, json) = post_filter(&[
            Part::Text("sequence_text", ">x\nAAGT\nGAAA\n>y\nTTTTTTTT\n"),
            Part::Text("reference", "agtg"),
            Part::Text("threshold", "100"),
        ])
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["records_loaded"], 2);
        assert_eq!(json["matched_count"], 1);
        assert_eq!(json["matches"][0]["id"], "x");
        assert_eq!(json["matches"][0]["offset"], 1);
        assert_eq!(json["matches"][0]["window"], "AGTG");
        assert_eq!(json["unmatched"][0], "y");
        assert_eq!(json["fasta"], ">x\nAGTG\n");
        assert_eq!(json["download_name"], "filtered_partial.fasta");
        assert_eq!(json["configuration"]["policy"], "first-qualifying");
    }

    #[tokio::test]
    async fn test_filter_uploaded_file_best_scoring() {
        let (status, json) = post_filter(&[
            Part::File("reads.fasta", b">r\nAGTAAGTG\n"),
            Part::Text("reference", "AGTG"),
            Part::Text("threshold", "75"),
            Part::Text("policy", "best-scoring"),
        ])
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matches"][0]["offset"], 4);
        assert_eq!(json["matches"][0]["identity"], 1.0);
        assert_eq!(json["configuration"]["filename"], "reads.fasta");
    }

    #[tokio::test]
    async fn test_filter_gzip_upload() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">x\nAAGTGAAA\n").unwrap();
        let gz = encoder.finish().unwrap();

        let (status, json) = post_filter(&[
            Part::File("reads.fa.gz", &gz),
            Part::Text("reference", "AGTG"),
        ])
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matched_count"], 1);
    }

    #[tokio::test]
    async fn test_empty_file_part_falls_back_to_text() {
        let (status, json) = post_filter(&[
            Part::File("", b""),
            Part::Text("sequence_text", ">x\nAGTG\n"),
            Part::Text("reference", "AGTG"),
        ])
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["matched_count"], 1);
    }

    #[tokio::test]
    async fn test_missing_reference() {
        let (status, json) = post_filter(&[
            Part::Text("sequence_text", ">x\nAGTG\n"),
            Part::Text("reference", "   "),
        ])
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "missing_reference");
        assert!(json["details"].is_null());
    }

    #[tokio::test]
    async fn test_missing_input() {
        let (status, json) = post_filter(&[Part::Text("reference", "AGTG")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "missing_input");
    }

    #[tokio::test]
    async fn test_invalid_policy() {
        let (status, json) = post_filter(&[
            Part::Text("sequence_text", ">x\nAGTG\n"),
            Part::Text("reference", "AGTG"),
            Part::Text("policy", "random"),
        ])
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_policy");
    }

    #[tokio::test]
    async fn test_dangerous_filename_rejected() {
        let (status, json) = post_filter(&[
            Part::File("../../etc/passwd", b">x\nAGTG\n"),
            Part::Text("reference", "AGTG"),
        ])
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_filename");
    }

    #[tokio::test]
    async fn test_threshold_is_clamped() {
        let (status, json) = post_filter(&[
            Part::Text("sequence_text", ">x\nAGTG\n"),
            Part::Text("reference", "AGTG"),
            Part::Text("threshold", "250"),
        ])
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["configuration"]["threshold"], 1.0);
        assert_eq!(json["matched_count"], 1);
    }

    #[tokio::test]
    async fn test_too_many_fields() {
        let parts: Vec<Part<'_>> = (0..=MAX_MULTIPART_FIELDS)
            .map(|_| Part::Text("extra", "x"))
            .collect();
        let (status, json) = post_filter(&parts).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "field_limit_exceeded");
    }

    #[test]
    fn test_create_router() {
        assert!(create_router().is_ok());
    }
}
