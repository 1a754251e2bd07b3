//! Command-line interface for fasta-filter.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **filter**: Keep the records whose best window matches a reference
//! - **search**: Run the window search on a single sequence
//! - **score**: Identity between two equal-length sequences
//! - **serve**: Start the web interface
//!
//! ## Usage
//!
//! ```text
//! # Keep records containing a window with >= 90% identity to the reference
//! fasta-filter filter reads.fasta --reference AGTGNNRY
//!
//! # Pipe from another tool and pick the best window per record
//! zcat reads.fa.gz | fasta-filter filter - -r AGTG --policy best-scoring -t 80
//!
//! # JSON output for scripting
//! fasta-filter filter reads.fasta -r AGTG --format json
//!
//! # Start web UI
//! fasta-filter serve --port 8080 --open
//! ```

use clap::{Parser, Subcommand};

pub mod filter;
pub mod score;
pub mod search;

#[derive(Parser)]
#[command(name = "fasta-filter")]
#[command(version)]
#[command(about = "Find reference-like windows in FASTA records using IUPAC-aware identity")]
#[command(
    long_about = "fasta-filter slides a reference sequence along every record of a FASTA file and keeps the records that contain a window with enough identity to it.\n\nComparison understands IUPAC ambiguity codes (R, Y, N, ...) and ignores gap positions ('-'). For each record it reports:\n- The selected window and its offset\n- The identity of that window\n- The filtered windows as FASTA"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter FASTA records by their best-matching window
    Filter(filter::FilterArgs),

    /// Search a single sequence for a reference window
    Search(search::SearchArgs),

    /// Score two equal-length sequences
    Score(score::ScoreArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
    Fasta,
}

/// Format an identity fraction as a percentage for display
pub(crate) fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
