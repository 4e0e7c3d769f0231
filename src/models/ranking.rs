//! Shared ordinal severity scale and per-tool severity vocabularies.

use serde::{Deserialize, Serialize};

use crate::errors::ReportError;

/// Four-level ranking every adapter normalizes into.
///
/// Variant order is the ordinal order: `Info < Low < Medium < High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ranking {
    Info,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Static mapping from one tool's native severity literals to [`Ranking`].
///
/// Lookups are exact. A literal outside the declared vocabulary is an
/// [`ReportError::UnknownSeverity`], never a fallback level.
#[derive(Debug, Clone, Copy)]
pub struct RankingScale {
    tool: &'static str,
    entries: &'static [(&'static str, Ranking)],
}

impl RankingScale {
    pub const fn new(tool: &'static str, entries: &'static [(&'static str, Ranking)]) -> Self {
        Self { tool, entries }
    }

    /// Map a native severity literal onto the shared scale.
    pub fn rank(&self, native: &str) -> Result<Ranking, ReportError> {
        self.entries
            .iter()
            .find(|(literal, _)| *literal == native)
            .map(|(_, ranking)| *ranking)
            .ok_or_else(|| ReportError::UnknownSeverity {
                tool: self.tool.to_string(),
                severity: native.to_string(),
            })
    }

    /// Native literals this scale declares, in declaration order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(literal, _)| *literal)
    }
}
