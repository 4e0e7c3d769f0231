//! Normalized output records: findings, metadata, and the per-call report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::ranking::Ranking;

/// One finding as reported by a tool, with its severity normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vulnerability {
    pub ranking: Ranking,
    pub original_severity: String,
    pub name: Option<String>,
    /// Tool-specific fields, kept as reported.
    pub details: serde_json::Value,
}

/// Report metadata extracted before any finding is parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach an extra key when a value was found.
    pub fn with(mut self, key: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.extra.insert(key.to_string(), value);
        }
        self
    }
}

/// One request/response pair segmented from an HTTP transaction log.
///
/// Missing segments stay `None` rather than failing the parse. `id` is
/// `None` when the log's request number does not fit a `u32`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpTransaction {
    pub id: Option<u32>,
    pub request: Option<String>,
    pub response_status: Option<String>,
    pub response_headers: Option<String>,
    pub response_body: Option<String>,
}

impl HttpTransaction {
    pub fn is_partial(&self) -> bool {
        self.request.is_none()
            || self.response_status.is_none()
            || self.response_headers.is_none()
            || self.response_body.is_none()
    }
}

/// Result of one orchestration call.
///
/// An empty report (no tool, no sources) means no file was found or no
/// adapter claimed it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub tool: Option<String>,
    pub sources: Vec<PathBuf>,
    pub metadata: Option<Metadata>,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<HttpTransaction>,
}

impl Report {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no adapter produced this report.
    pub fn is_empty(&self) -> bool {
        self.tool.is_none()
    }

    /// Highest ranking across all findings, if any.
    pub fn highest_ranking(&self) -> Option<Ranking> {
        self.vulnerabilities.iter().map(|v| v.ranking).max()
    }
}
