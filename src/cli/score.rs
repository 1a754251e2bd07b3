//! Score command - identity between two equal-length sequences.
//!
//! Both sequences are compared position by position with IUPAC-aware
//! matching. Gap positions on either side are not counted.

use clap::Args;

use crate::cli::{percent, OutputFormat};
use crate::core::iupac::{bases_of, is_gap};
use crate::core::types::Identity;
use crate::matching::scoring::score;

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// First sequence (typically a window from a record)
    #[arg(required = true)]
    pub window: String,

    /// Second sequence (typically the reference)
    #[arg(required = true)]
    pub reference: String,

    /// Show the comparison of every position
    #[arg(long)]
    pub positions: bool,
}

/// Execute the score command
///
/// # Errors
///
/// Returns an error if the sequences differ in length, for FASTA output, or
/// for `--positions` with TSV output.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScoreArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match format {
        OutputFormat::Fasta => anyhow::bail!("The score command has no FASTA output"),
        OutputFormat::Tsv if args.positions => {
            anyhow::bail!("--positions is not supported with TSV output")
        }
        _ => {}
    }

    let window = args.window.trim().to_ascii_uppercase().into_bytes();
    let reference = args.reference.trim().to_ascii_uppercase().into_bytes();

    if window.len() != reference.len() {
        anyhow::bail!(
            "Sequences must have the same length (got {} and {})",
            window.len(),
            reference.len()
        );
    }

    let identity = score(&window, &reference);
    if verbose {
        eprintln!(
            "{} positions, {} skipped as gaps",
            window.len(),
            window.len() - identity.compared
        );
    }

    match format {
        OutputFormat::Text | OutputFormat::Fasta => {
            print_text(identity);
            if args.positions {
                print_positions(&window, &reference);
            }
        }
        OutputFormat::Json => {
            let mut output = serde_json::json!({
                "length": window.len(),
                "identity": identity.fraction(),
                "matches": identity.matches,
                "compared": identity.compared,
            });
            if args.positions {
                output["positions"] = position_rows(&window, &reference)
                    .map(|(pos, a, b, result)| {
                        serde_json::json!({
                            "position": pos,
                            "window": char::from(a).to_string(),
                            "reference": char::from(b).to_string(),
                            "result": result,
                        })
                    })
                    .collect();
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("identity\tmatches\tcompared");
            println!(
                "{:.4}\t{}\t{}",
                identity.fraction(),
                identity.matches,
                identity.compared
            );
        }
    }

    Ok(())
}

fn print_text(identity: Identity) {
    println!(
        "Identity: {} ({}/{} compared positions)",
        percent(identity.fraction()),
        identity.matches,
        identity.compared
    );
}

/// Per-position comparison: index, both symbols and the outcome
fn position_rows<'a>(
    window: &'a [u8],
    reference: &'a [u8],
) -> impl Iterator<Item = (usize, u8, u8, String)> + 'a {
    window
        .iter()
        .zip(reference)
        .enumerate()
        .map(|(i, (&a, &b))| (i, a, b, compare_position(a, b)))
}

fn compare_position(a: u8, b: u8) -> String {
    if is_gap(a) || is_gap(b) {
        "gap".to_string()
    } else if bases_of(a).intersects(bases_of(b)) {
        format!("match {}", bases_of(a).intersection(bases_of(b)))
    } else {
        "mismatch".to_string()
    }
}

fn print_positions(window: &[u8], reference: &[u8]) {
    println!("\npos\twindow\treference\tresult");
    for (i, a, b, result) in position_rows(window, reference) {
        println!("{i}\t{}\t{}\t{result}", char::from(a), char::from(b));
    }
}
