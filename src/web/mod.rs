//! Web server for browser-based FASTA filtering.
//!
//! This module provides a single-page interface using Axum. Users upload a
//! FASTA file or paste records, enter a reference, pick a threshold and a
//! selection policy, and download the matched windows.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! fasta-filter serve
//!
//! # Custom port and auto-open browser
//! fasta-filter serve --port 3000 --open
//!
//! # Bind to all interfaces
//! fasta-filter serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /` - Main page with upload form
//! - `POST /api/filter` - Filter records against a reference (multipart form)

pub mod server;
