//! Search command - slide a reference along a single sequence.
//!
//! Useful for checking how one sequence would be treated by `filter` without
//! preparing a FASTA file.

use clap::Args;

use crate::cli::{percent, OutputFormat};
use crate::core::types::{SelectionPolicy, WindowMatch};
use crate::matching::filter::DEFAULT_THRESHOLD_PERCENT;
use crate::matching::window::{search, window_count};
use crate::utils::validation::validate_reference;

/// Arguments for the search command
#[derive(Args)]
pub struct SearchArgs {
    /// Sequence to search (IUPAC codes and '-' gaps allowed)
    #[arg(required = true)]
    pub sequence: String,

    /// Reference sequence to look for
    #[arg(short, long, required = true)]
    pub reference: String,

    /// Minimum identity in percent (0-100)
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD_PERCENT, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub threshold: u32,

    /// Window selection policy
    #[arg(long, value_enum, default_value_t = SelectionPolicy::FirstQualifying)]
    pub policy: SelectionPolicy,
}

/// Execute the search command
///
/// # Errors
///
/// Returns an error if either sequence is empty after removing whitespace.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let sequence = normalize_sequence(&args.sequence);
    let reference = validate_reference(&args.reference)?;
    let threshold = f64::from(args.threshold) / 100.0;

    if verbose {
        eprintln!(
            "Sequence: {} symbols, reference: {} symbols, {} candidate windows",
            sequence.len(),
            reference.len(),
            window_count(sequence.len(), reference.len())
        );
    }

    let hit = search(&sequence, &reference, threshold, args.policy);

    match format {
        OutputFormat::Text => print_text(hit.as_ref(), threshold, args.policy),
        OutputFormat::Json => print_json(hit.as_ref(), threshold, args.policy)?,
        OutputFormat::Tsv => print_tsv(hit.as_ref()),
        OutputFormat::Fasta => {
            if let Some(m) = &hit {
                println!(">offset_{}\n{}", m.offset, m.window_str());
            }
        }
    }

    Ok(())
}

/// Strip whitespace and uppercase, keeping every other symbol
fn normalize_sequence(text: &str) -> Vec<u8> {
    text.bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| b.to_ascii_uppercase())
        .collect()
}

fn print_text(hit: Option<&WindowMatch>, threshold: f64, policy: SelectionPolicy) {
    match hit {
        Some(m) => {
            println!("Window:   {}", m.window_str());
            println!("Offset:   {}", m.offset);
            println!(
                "Identity: {} ({}/{} compared positions)",
                percent(m.identity.fraction()),
                m.identity.matches,
                m.identity.compared
            );
        }
        None => println!(
            "No window with identity >= {} ({policy})",
            percent(threshold)
        ),
    }
}

fn print_json(
    hit: Option<&WindowMatch>,
    threshold: f64,
    policy: SelectionPolicy,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "threshold": threshold,
        "policy": policy,
        "match": hit.map(|m| serde_json::json!({
            "offset": m.offset,
            "window": m.window_str(),
            "identity": m.identity.fraction(),
            "matches": m.identity.matches,
            "compared": m.identity.compared,
        })),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv(hit: Option<&WindowMatch>) {
    println!("offset\twindow\tidentity\tmatches\tcompared");
    if let Some(m) = hit {
        println!(
            "{}\t{}\t{:.4}\t{}\t{}",
            m.offset,
            m.window_str(),
            m.identity.fraction(),
            m.identity.matches,
            m.identity.compared
        );
    }
}
