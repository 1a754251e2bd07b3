use std::fmt::Write as _;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::record::{RecordSet, SequenceRecord};
use crate::core::types::{SelectionPolicy, WindowMatch};
use crate::matching::window::search;

/// Default minimum identity
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Default threshold as a percentage, for percentage-based controls
pub const DEFAULT_THRESHOLD_PERCENT: u32 = 90;

/// Suggested file name for filtered output
pub const DEFAULT_OUTPUT_NAME: &str = "filtered_partial.fasta";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("Thread count must be at least 1")]
    ZeroThreads,

    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration for a filtering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum identity in `[0, 1]` (inclusive)
    pub threshold: f64,

    /// Window selection policy
    pub policy: SelectionPolicy,

    /// Search records in parallel
    pub parallel: bool,

    /// Worker threads for parallel search (`None` = rayon's global pool)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            policy: SelectionPolicy::default(),
            parallel: true,
            threads: None,
        }
    }
}

impl FilterConfig {
    /// Config with a threshold given as a percentage (0-100)
    #[must_use]
    pub fn from_percent(percent: u32, policy: SelectionPolicy) -> Self {
        Self {
            threshold: f64::from(percent) / 100.0,
            policy,
            ..Self::default()
        }
    }

    /// Load a config from a JSON file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::ParseError` for invalid JSON, or a validation error.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the threshold range and thread count
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ThresholdOutOfRange` for a threshold outside
    /// `[0, 1]` (including NaN) or `ConfigError::ZeroThreads`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

/// A record whose selected window met the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRecord {
    pub id: String,

    #[serde(flatten)]
    pub hit: WindowMatch,
}

/// Result of filtering a record set
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOutcome {
    /// Qualifying records, in input order
    pub matched: Vec<MatchedRecord>,

    /// Identifiers with no qualifying window, in input order
    pub unmatched: Vec<String>,

    /// Number of records searched
    pub total: usize,
}

impl FilterOutcome {
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    /// Fraction of records with a qualifying window (0 for an empty input)
    #[must_use]
    pub fn match_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.matched.len() as f64 / self.total as f64
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WindowMatch> {
        self.matched.iter().find(|m| m.id == id).map(|m| &m.hit)
    }

    #[must_use]
    pub fn to_fasta_text(&self) -> String {
        to_fasta_text(&self.matched)
    }
}

/// Render matched windows as FASTA: `>id` then the window, each line newline-terminated.
///
/// # Examples
///
/// ```
/// use fasta_filter::core::RecordSet;
/// use fasta_filter::matching::filter::{to_fasta_text, FilterConfig, FilterEngine};
///
/// let records = RecordSet::from_pairs([("x", "AAGTGAAA")]);
/// let engine = FilterEngine::new(FilterConfig { threshold: 1.0, ..FilterConfig::default() });
/// let outcome = engine.filter(&records, b"AGTG");
/// assert_eq!(to_fasta_text(&outcome.matched), ">x\nAGTG\n");
/// ```
#[must_use]
pub fn to_fasta_text(matches: &[MatchedRecord]) -> String {
    let mut out = String::new();
    for m in matches {
        // Writing to a String cannot fail
        let _ = writeln!(out, ">{}\n{}", m.id, m.hit.window_str());
    }
    out
}

/// Applies the window search to every record of a set
pub struct FilterEngine {
    config: FilterConfig,
    /// Dedicated pool when `threads` is set, built once per engine
    pool: Option<rayon::ThreadPool>,
}

impl FilterEngine {
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        let pool = match config.threads {
            Some(n) if config.parallel => {
                match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                    Ok(pool) => Some(pool),
                    Err(e) => {
                        warn!("Failed to build a {n}-thread pool ({e}), using the global pool");
                        None
                    }
                }
            }
            _ => None,
        };
        Self { config, pool }
    }

    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Search one record
    #[must_use]
    pub fn search_record(
        &self,
        record: &SequenceRecord,
        reference: &[u8],
    ) -> Option<WindowMatch> {
        let hit = search(
            &record.sequence,
            reference,
            self.config.threshold,
            self.config.policy,
        );
        match &hit {
            Some(m) => debug!(
                "{}: window at offset {} ({:.1}% identity)",
                record.id,
                m.offset,
                m.identity.fraction() * 100.0
            ),
            None => debug!("{}: no qualifying window", record.id),
        }
        hit
    }

    /// Filter `records` against `reference`, keeping input order.
    ///
    /// The reference is uppercased before searching. An empty reference or
    /// record set yields an empty outcome.
    #[must_use]
    pub fn filter(&self, records: &RecordSet, reference: &[u8]) -> FilterOutcome {
        let reference = reference.to_ascii_uppercase();
        let hits = self.search_all(records.as_slice(), &reference);

        let mut outcome = FilterOutcome {
            total: records.len(),
            ..FilterOutcome::default()
        };
        for (record, hit) in records.iter().zip(hits) {
            match hit {
                Some(hit) => outcome.matched.push(MatchedRecord {
                    id: record.id.clone(),
                    hit,
                }),
                None => outcome.unmatched.push(record.id.clone()),
            }
        }

        info!(
            "{} of {} records have a window with identity >= {:.1}% ({})",
            outcome.matched.len(),
            outcome.total,
            self.config.threshold * 100.0,
            self.config.policy
        );
        outcome
    }

    fn search_all(
        &self,
        records: &[SequenceRecord],
        reference: &[u8],
    ) -> Vec<Option<WindowMatch>> {
        if !self.config.parallel || records.len() < 2 {
            return records
                .iter()
                .map(|r| self.search_record(r, reference))
                .collect();
        }

        // Indexed parallel collect keeps input order.
        let run = || -> Vec<Option<WindowMatch>> {
            records
                .par_iter()
                .map(|r| self.search_record(r, reference))
                .collect()
        };

        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
