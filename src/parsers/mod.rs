//! Report format adapters for normalizing findings from various tools.
//!
//! Each adapter implements the `Parser` trait: a cheap ownership probe,
//! version-gated metadata extraction, and finding extraction into the shared
//! `Vulnerability` schema. New tools are added by registering another
//! adapter, never by changing the orchestrator.

pub mod dirbuster;
pub mod http_transactions;
pub mod nmap;
pub mod source;
pub mod version;
pub mod w3af;

use crate::errors::ReportError;
use crate::models::ranking::{Ranking, RankingScale};
use crate::models::report::{Metadata, Vulnerability};

pub use source::{FormatKind, Source};
pub use version::{VersionGate, VersionSpec};

/// Static, registration-time description of one tool's reports.
#[derive(Debug, Clone, Copy)]
pub struct ParserDescriptor {
    pub tool: &'static str,
    pub format: FormatKind,
    /// Filename glob used when the caller does not supply one.
    pub default_filename: &'static str,
    pub supported_versions: VersionSpec,
    pub ranking_scale: RankingScale,
    /// Glob of a companion HTTP transaction log, if the tool writes one.
    pub http_log_filename: Option<&'static str>,
}

/// Trait for pluggable report format adapters.
///
/// Adapters are stateless; every per-file value flows through the `Source`
/// argument so one registry can serve concurrent orchestration calls.
pub trait Parser: Send + Sync {
    fn descriptor(&self) -> &ParserDescriptor;

    /// Whether this adapter owns the source. Never fails: a source that does
    /// not look like this tool's format is simply not claimed.
    fn is_mine(&self, source: &Source) -> bool;

    /// Extract metadata and pass it through the version gate.
    fn parse_metadata(&self, source: &Source) -> Result<Metadata, ReportError>;

    /// Extract findings. Only called after `parse_metadata` succeeded.
    fn parse_report(&self, source: &Source) -> Result<Vec<Vulnerability>, ReportError>;

    /// The tool name this adapter handles.
    fn source_tool(&self) -> &str {
        self.descriptor().tool
    }

    /// Map a tool-specific severity literal to the shared ranking.
    fn map_severity(&self, tool_severity: &str) -> Result<Ranking, ReportError> {
        self.descriptor().ranking_scale.rank(tool_severity)
    }
}

/// Ordered, read-only set of adapters consulted by the orchestrator.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn Parser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Append an adapter. Earlier adapters are probed first.
    pub fn register(mut self, parser: impl Parser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Parser> {
        self.parsers.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    /// All built-in adapters: w3af, Nmap, DirBuster.
    fn default() -> Self {
        Self::new()
            .register(w3af::W3afParser::new())
            .register(nmap::NmapParser::new())
            .register(dirbuster::DirBusterParser::new())
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|p| p.source_tool()))
            .finish()
    }
}

/// Render a Unix timestamp string (seconds) as RFC 3339 UTC.
pub(crate) fn epoch_to_rfc3339(raw: &str) -> Option<String> {
    let secs = raw.trim().parse::<i64>().ok()?;
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
}

/// Return Some(s) if s is non-empty after trimming, None otherwise.
pub(crate) fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
