//! Filter command - keep the records that contain a window matching the reference.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use crate::cli::{percent, OutputFormat};
use crate::core::iupac::is_recognized;
use crate::core::record::RecordSet;
use crate::core::types::SelectionPolicy;
use crate::matching::filter::{FilterConfig, FilterEngine, FilterOutcome};
use crate::parsing::fasta::{is_fasta_file, parse_fasta_file, parse_fasta_reader};
use crate::utils::validation::validate_reference;

#[derive(Args)]
pub struct FilterArgs {
    /// Input FASTA file (.fa, .fasta, .fna, .txt, optionally .gz)
    /// Use '-' for stdin
    #[arg(required = true)]
    pub input: PathBuf,

    /// Reference sequence (IUPAC codes allowed, case-insensitive)
    #[arg(
        short,
        long,
        required_unless_present = "reference_file",
        conflicts_with = "reference_file"
    )]
    pub reference: Option<String>,

    /// Read the reference from the first record of a FASTA file
    #[arg(long)]
    pub reference_file: Option<PathBuf>,

    /// Minimum identity in percent (0-100, default 90)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub threshold: Option<u32>,

    /// Window selection policy (default first-qualifying)
    #[arg(long, value_enum)]
    pub policy: Option<SelectionPolicy>,

    /// JSON config file with threshold (0-1), policy, parallel and threads;
    /// command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the matched windows as FASTA to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List records without a qualifying window (text and TSV output)
    #[arg(long)]
    pub show_unmatched: bool,

    /// Worker threads for the search (default: all cores)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Search records one at a time on the current thread
    #[arg(long)]
    pub serial: bool,
}

/// Execute the filter command
///
/// # Errors
///
/// Returns an error if the inputs cannot be read or parsed, the configuration
/// is invalid, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FilterArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let reference = load_reference(&args)?;
    let records = load_records(&args.input)?;

    if verbose {
        eprintln!(
            "Loaded {} records ({} symbols); reference is {} symbols",
            records.len(),
            records.total_length(),
            reference.len()
        );
        eprintln!(
            "Threshold {} ({})",
            percent(config.threshold),
            config.policy
        );
    }

    let engine = FilterEngine::new(config);
    let outcome = engine.filter(&records, &reference);

    if let Some(path) = &args.output {
        std::fs::write(path, outcome.to_fasta_text())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} records to {}", outcome.matched_count(), path.display());
    }

    if outcome.matched.is_empty() {
        eprintln!("No matching windows found.");
    }

    match format {
        OutputFormat::Text => print_text_results(&outcome, engine.config(), args.show_unmatched),
        OutputFormat::Json => print_json_results(&outcome, engine.config(), &reference)?,
        OutputFormat::Tsv => print_tsv_results(&outcome, args.show_unmatched),
        OutputFormat::Fasta => print_fasta_results(&outcome)?,
    }

    Ok(())
}

fn build_config(args: &FilterArgs) -> anyhow::Result<FilterConfig> {
    let mut config = match &args.config {
        Some(path) => FilterConfig::load_from_file(path)
            .with_context(|| format!("Invalid config file {}", path.display()))?,
        None => FilterConfig::default(),
    };

    if let Some(pct) = args.threshold {
        config.threshold = f64::from(pct) / 100.0;
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Some(threads) = args.threads {
        config.threads = Some(threads as usize);
    }
    if args.serial {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

fn load_reference(args: &FilterArgs) -> anyhow::Result<Vec<u8>> {
    let reference = read_reference(args)?;

    let unknown = reference.iter().filter(|&&b| !is_recognized(b)).count();
    if unknown > 0 {
        warn!("Reference has {unknown} symbols outside the IUPAC alphabet; they never match");
    }
    Ok(reference)
}

fn read_reference(args: &FilterArgs) -> anyhow::Result<Vec<u8>> {
    if let Some(text) = &args.reference {
        return Ok(validate_reference(text)?);
    }

    let path = args
        .reference_file
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--reference or --reference-file is required"))?;
    let records = parse_fasta_file(path)
        .with_context(|| format!("Failed to read reference from {}", path.display()))?;
    let first = records
        .iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No records found in {}", path.display()))?;

    Ok(validate_reference(&first.sequence_str())?)
}

fn load_records(input: &Path) -> anyhow::Result<RecordSet> {
    // Handle stdin
    if input.to_string_lossy() == "-" {
        return Ok(parse_fasta_reader(std::io::stdin().lock())?);
    }

    if !is_fasta_file(input) {
        warn!(
            "{} has no FASTA extension, reading it as FASTA text",
            input.display()
        );
    }
    parse_fasta_file(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn print_text_results(outcome: &FilterOutcome, config: &FilterConfig, show_unmatched: bool) {
    println!("Records loaded: {}", outcome.total);
    println!(
        "Records with identity >= {} ({}): {}",
        percent(config.threshold),
        config.policy,
        outcome.matched_count()
    );

    for m in &outcome.matched {
        println!(
            "\n>{}\n   Window: {} (offset {})\n   Identity: {} ({}/{} compared positions)",
            m.id,
            m.hit.window_str(),
            m.hit.offset,
            percent(m.hit.identity.fraction()),
            m.hit.identity.matches,
            m.hit.identity.compared,
        );
    }

    if show_unmatched && !outcome.unmatched.is_empty() {
        println!("\nNo qualifying window:");
        for id in &outcome.unmatched {
            println!("   {id}");
        }
    }
}

fn print_json_results(
    outcome: &FilterOutcome,
    config: &FilterConfig,
    reference: &[u8],
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "reference": String::from_utf8_lossy(reference),
        "configuration": {
            "threshold": config.threshold,
            "policy": config.policy,
        },
        "records_loaded": outcome.total,
        "matched_count": outcome.matched_count(),
        "matches": outcome.matched.iter().map(|m| {
            serde_json::json!({
                "id": m.id,
                "offset": m.hit.offset,
                "window": m.hit.window_str(),
                "identity": m.hit.identity.fraction(),
                "matches": m.hit.identity.matches,
                "compared": m.hit.identity.compared,
            })
        }).collect::<Vec<_>>(),
        "unmatched": outcome.unmatched,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(outcome: &FilterOutcome, show_unmatched: bool) {
    println!("id\tstatus\toffset\twindow\tidentity\tmatches\tcompared");

    for m in &outcome.matched {
        println!(
            "{}\tmatched\t{}\t{}\t{:.4}\t{}\t{}",
            m.id,
            m.hit.offset,
            m.hit.window_str(),
            m.hit.identity.fraction(),
            m.hit.identity.matches,
            m.hit.identity.compared,
        );
    }

    if show_unmatched {
        for id in &outcome.unmatched {
            println!("{id}\tunmatched\t\t\t\t\t");
        }
    }
}

fn print_fasta_results(outcome: &FilterOutcome) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(outcome.to_fasta_text().as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn args(input: PathBuf) -> FilterArgs {
        FilterArgs {
            input,
            reference: Some("AGTG".to_string()),
            reference_file: None,
            threshold: None,
            policy: None,
            config: None,
            output: None,
            show_unmatched: false,
            threads: None,
            serial: false,
        }
    }

    #[test]
    fn test_build_config_defaults() {
        let config = build_config(&args(PathBuf::from("-"))).unwrap();
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_build_config_flags_override_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"threshold": 0.5, "policy": "best-scoring"}}"#).unwrap();
        file.flush().unwrap();

        let mut a = args(PathBuf::from("-"));
        a.config = Some(file.path().to_path_buf());
        a.threshold = Some(80);
        a.serial = true;

        let config = build_config(&a).unwrap();
        assert!((config.threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.policy, SelectionPolicy::BestScoring);
        assert!(!config.parallel);
    }

    #[test]
    fn test_load_reference_from_file() {
        let mut file = NamedTempFile::with_suffix(".fa").unwrap();
        writeln!(file, ">ref\nag\ntg\n>other\nCCCC").unwrap();
        file.flush().unwrap();

        let mut a = args(PathBuf::from("-"));
        a.reference = None;
        a.reference_file = Some(file.path().to_path_buf());
        assert_eq!(load_reference(&a).unwrap(), b"AGTG");
    }

    #[test]
    fn test_load_reference_rejects_blank() {
        let mut a = args(PathBuf::from("-"));
        a.reference = Some("  ".to_string());
        assert!(load_reference(&a).is_err());
    }

    #[test]
    fn test_run_writes_output_file() {
        let mut input = NamedTempFile::with_suffix(".fasta").unwrap();
        writeln!(input, ">x\nAAGT\nGAAA\n>y\nTTTTTTTT").unwrap();
        input.flush().unwrap();
        let output = NamedTempFile::with_suffix(".fasta").unwrap();

        let mut a = args(input.path().to_path_buf());
        a.threshold = Some(100);
        a.output = Some(output.path().to_path_buf());
        run(a, OutputFormat::Tsv, false).unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        assert_eq!(written, ">x\nAGTG\n");
    }
}
