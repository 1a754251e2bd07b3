use serde::{Deserialize, Serialize};

use crate::core::record::serialize_symbols;

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Rule for choosing which qualifying window represents a sequence
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Lowest offset whose identity meets the threshold; scanning stops there
    #[default]
    FirstQualifying,
    /// Highest identity among windows meeting the threshold; ties go to the lowest offset
    BestScoring,
}

impl SelectionPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstQualifying => "first-qualifying",
            Self::BestScoring => "best-scoring",
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "first-qualifying" | "first" => Ok(Self::FirstQualifying),
            "best-scoring" | "best" => Ok(Self::BestScoring),
            other => Err(format!("Unknown selection policy: {other}")),
        }
    }
}

/// Identity between two equal-length symbol sequences.
///
/// Kept as the underlying counts so callers can report both the ratio and
/// how many positions contributed to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Compared positions whose symbols are compatible
    pub matches: usize,

    /// Positions where neither symbol is a gap
    pub compared: usize,
}

impl Identity {
    #[must_use]
    pub const fn new(matches: usize, compared: usize) -> Self {
        Self { matches, compared }
    }

    /// `matches / compared`, or `0.0` when no position was compared
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.compared == 0 {
            0.0
        } else {
            count_to_f64(self.matches) / count_to_f64(self.compared)
        }
    }

    /// Inclusive threshold test
    #[must_use]
    pub fn meets(&self, threshold: f64) -> bool {
        self.fraction() >= threshold
    }
}

/// A reference-length window selected from a sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowMatch {
    /// 0-based start of the window in the parent sequence
    pub offset: usize,

    /// The window's symbols
    #[serde(serialize_with = "serialize_symbols")]
    pub window: Vec<u8>,

    pub identity: Identity,
}

impl WindowMatch {
    #[must_use]
    pub fn window_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.window)
    }
}
