//! Report orchestration: locate, select an adapter, gate, extract.
//!
//! One call walks `locate -> select -> bind -> metadata -> findings` and
//! ends in one of three states:
//! - empty: no file found, or no adapter claimed the located files
//! - rejected: a claimed file failed its adapter's version gate
//! - success: the normalized report
//!
//! Calls share nothing but the read-only registry, so independent roots can
//! be parsed concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ReportError;
use crate::models::report::{HttpTransaction, Report};
use crate::parsers::source::{self, SourceCache};
use crate::parsers::{http_transactions, FormatKind, Parser, ParserRegistry, Source};
use crate::services::locator;

/// Caller-controlled knobs for one orchestration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Filename glob overriding every adapter's default.
    pub filename: Option<String>,
    pub recursive: bool,
    /// Probe only the first located file instead of every match.
    pub first_only: bool,
    /// Skip companion HTTP transaction logs.
    pub light: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            filename: None,
            recursive: true,
            first_only: true,
            light: false,
        }
    }
}

/// Drives adapters from a shared registry over one directory at a time.
#[derive(Debug, Clone)]
pub struct ReportOrchestrator {
    registry: Arc<ParserRegistry>,
}

/// An adapter bound to the sources it claimed. Owns those sources.
struct BoundReport<'r> {
    parser: &'r dyn Parser,
    sources: Vec<Source>,
}

impl ReportOrchestrator {
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Run one orchestration call over `root`.
    pub fn parse(&self, root: &Path, options: &ParseOptions) -> Result<Report, ReportError> {
        let mut cache = SourceCache::new();
        let Some(bound) = self.select(root, options, &mut cache)? else {
            tracing::info!(root = %root.display(), "No supported report found");
            return Ok(Report::empty());
        };
        bound.extract(root, options)
    }

    /// Bind the first adapter, in registry order, that claims a located file.
    fn select(
        &self,
        root: &Path,
        options: &ParseOptions,
        cache: &mut SourceCache,
    ) -> Result<Option<BoundReport<'_>>, ReportError> {
        for parser in self.registry.iter() {
            let descriptor = parser.descriptor();
            let pattern = options
                .filename
                .as_deref()
                .unwrap_or(descriptor.default_filename);

            let located = locator::find(root, pattern, options.recursive);
            let candidates = if options.first_only {
                &located[..located.len().min(1)]
            } else {
                &located[..]
            };

            let mut claimed: Vec<&PathBuf> = Vec::new();
            for path in candidates {
                if probe(parser, path, descriptor.format, cache)? {
                    claimed.push(path);
                }
            }
            if claimed.is_empty() {
                continue;
            }

            let sources: Vec<Source> = claimed
                .into_iter()
                .filter_map(|path| cache.take(path, descriptor.format))
                .collect();
            tracing::info!(
                root = %root.display(),
                tool = parser.source_tool(),
                files = sources.len(),
                "Bound report adapter"
            );
            return Ok(Some(BoundReport { parser, sources }));
        }
        Ok(None)
    }
}

/// Ask one adapter about one file. Files that are not well-formed for the
/// adapter's format kind are simply not claimed.
fn probe(
    parser: &dyn Parser,
    path: &Path,
    kind: FormatKind,
    cache: &mut SourceCache,
) -> Result<bool, ReportError> {
    match cache.get_or_load(path, kind) {
        Ok(source) => {
            let mine = parser.is_mine(source);
            tracing::debug!(path = %path.display(), tool = parser.source_tool(), mine, "Probed report");
            Ok(mine)
        }
        Err(e) if e.is_malformed() => {
            tracing::debug!(path = %path.display(), tool = parser.source_tool(), error = %e, "Skipping malformed candidate");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

impl BoundReport<'_> {
    fn extract(self, root: &Path, options: &ParseOptions) -> Result<Report, ReportError> {
        let descriptor = self.parser.descriptor();

        // Every claimed file passes the gate before any finding is read.
        let mut metadata = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            metadata.push(self.parser.parse_metadata(source)?);
        }

        let mut vulnerabilities = Vec::new();
        for source in &self.sources {
            vulnerabilities.extend(self.parser.parse_report(source)?);
        }

        let transactions = match descriptor.http_log_filename {
            Some(pattern) if !options.light => load_transactions(root, pattern, options)?,
            _ => Vec::new(),
        };

        tracing::info!(
            tool = descriptor.tool,
            vulnerabilities = vulnerabilities.len(),
            transactions = transactions.len(),
            "Parsed report"
        );

        Ok(Report {
            tool: Some(descriptor.tool.to_string()),
            sources: self.sources.iter().map(|s| s.path().to_path_buf()).collect(),
            metadata: metadata.into_iter().next(),
            vulnerabilities,
            transactions,
        })
    }
}

fn load_transactions(
    root: &Path,
    pattern: &str,
    options: &ParseOptions,
) -> Result<Vec<HttpTransaction>, ReportError> {
    let located = locator::find(root, pattern, options.recursive);
    let files = if options.first_only {
        &located[..located.len().min(1)]
    } else {
        &located[..]
    };

    let mut transactions = Vec::new();
    for path in files {
        let source = source::load(path, FormatKind::Text)?;
        transactions.extend(http_transactions::parse(source.require_text()?));
    }
    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ranking::Ranking;

    fn orchestrator() -> ReportOrchestrator {
        ReportOrchestrator::new(Arc::new(ParserRegistry::default()))
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_options() {
        let options = ParseOptions::default();
        assert!(options.recursive);
        assert!(options.first_only);
        assert!(!options.light);
        assert!(options.filename.is_none());
    }

    #[test]
    fn malformed_xml_is_skipped_then_text_adapter_claims() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "DirBuster-Report-x.xml",
            include_str!("../../tests/fixtures/dirbuster_report.txt"),
        );
        let options = ParseOptions {
            filename: Some("DirBuster-Report*".to_string()),
            ..ParseOptions::default()
        };
        let report = orchestrator().parse(dir.path(), &options).unwrap();
        assert_eq!(report.tool.as_deref(), Some("dirbuster"));
        assert_eq!(report.vulnerabilities.len(), 5);
    }

    #[test]
    fn first_only_probes_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.xml", "<unrelated/>");
        write(dir.path(), "b.xml", include_str!("../../tests/fixtures/nmap_report.xml"));

        let report = orchestrator().parse(dir.path(), &ParseOptions::default()).unwrap();
        assert!(report.is_empty());

        let all = ParseOptions {
            first_only: false,
            ..ParseOptions::default()
        };
        let report = orchestrator().parse(dir.path(), &all).unwrap();
        assert_eq!(report.tool.as_deref(), Some("nmap"));
        assert_eq!(report.sources, vec![dir.path().join("b.xml")]);
    }

    #[test]
    fn all_matches_are_gated_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.xml", include_str!("../../tests/fixtures/w3af_report.xml"));
        write(
            dir.path(),
            "b.xml",
            "<w3af-run><w3af-version>Version: 2.0.0.0 </w3af-version></w3af-run>",
        );
        let all = ParseOptions {
            first_only: false,
            ..ParseOptions::default()
        };
        let err = orchestrator().parse(dir.path(), &all).unwrap_err();
        assert!(err.is_unsupported_version());
    }

    #[test]
    fn all_matches_concatenate_findings() {
        let dir = tempfile::tempdir().unwrap();
        let report = include_str!("../../tests/fixtures/w3af_report.xml");
        write(dir.path(), "a.xml", report);
        write(dir.path(), "nested/b.xml", report);
        let all = ParseOptions {
            first_only: false,
            light: true,
            ..ParseOptions::default()
        };
        let parsed = orchestrator().parse(dir.path(), &all).unwrap();
        assert_eq!(parsed.sources.len(), 2);
        assert_eq!(parsed.vulnerabilities.len(), 6);
        assert_eq!(parsed.metadata.unwrap().version, "1.6.0.2");
    }

    #[test]
    fn transactions_attached_unless_light() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "report.xml", include_str!("../../tests/fixtures/w3af_report.xml"));
        write(
            dir.path(),
            "output.http.txt",
            include_str!("../../tests/fixtures/w3af_output.http.txt"),
        );

        let full = orchestrator().parse(dir.path(), &ParseOptions::default()).unwrap();
        assert_eq!(full.transactions.len(), 2);
        assert_eq!(full.highest_ranking(), Some(Ranking::High));

        let light = ParseOptions {
            light: true,
            ..ParseOptions::default()
        };
        let report = orchestrator().parse(dir.path(), &light).unwrap();
        assert!(report.transactions.is_empty());
        assert_eq!(report.vulnerabilities, full.vulnerabilities);
    }

    #[test]
    fn empty_registry_claims_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "report.xml", include_str!("../../tests/fixtures/nmap_report.xml"));
        let orchestrator = ReportOrchestrator::new(Arc::new(ParserRegistry::new()));
        assert!(orchestrator.registry().is_empty());
        let report = orchestrator.parse(dir.path(), &ParseOptions::default()).unwrap();
        assert!(report.is_empty());
    }
}
