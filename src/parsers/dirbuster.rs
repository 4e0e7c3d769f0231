//! DirBuster plain-text report adapter.
//!
//! The report opens with a `DirBuster <version> - Report` banner, names the
//! target after the first separator line, then lists discovered paths under
//! `Dirs found with a <code> response:` and `Files found with a <code>
//! responce:` headings (the misspelling is DirBuster's own).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ReportError;
use crate::models::ranking::{Ranking, RankingScale};
use crate::models::report::{Metadata, Vulnerability};
use crate::parsers::version::first_version;
use crate::parsers::{FormatKind, Parser, ParserDescriptor, Source, VersionGate, VersionSpec};

/// Native literal attached to every discovered path.
const DISCOVERY: &str = "Information";

const DESCRIPTOR: ParserDescriptor = ParserDescriptor {
    tool: "dirbuster",
    format: FormatKind::Text,
    default_filename: "DirBuster-Report*",
    supported_versions: VersionSpec::Exact(&["1.0-RC1", "0.12"]),
    ranking_scale: RankingScale::new("dirbuster", &[(DISCOVERY, Ranking::Info)]),
    http_log_filename: None,
};

static GATE: Lazy<VersionGate> = Lazy::new(|| {
    VersionGate::new(&DESCRIPTOR.supported_versions).expect("valid dirbuster version list")
});

static RE_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*DirBuster (\S+) - Report").expect("valid banner regex"));

static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^Report produced on (.+?)\s*$").expect("valid report date regex")
});

static RE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^-{10,}\s*$").expect("valid separator regex"));

static RE_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(https?://\S+)\s*$").expect("valid target regex"));

static RE_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(Dirs|Files) found with a (\d{3}) respon[cs]e:\s*$")
        .expect("valid section regex")
});

/// Parser for DirBuster text reports.
#[derive(Debug, Default)]
pub struct DirBusterParser;

impl DirBusterParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for DirBusterParser {
    fn descriptor(&self) -> &ParserDescriptor {
        &DESCRIPTOR
    }

    fn is_mine(&self, source: &Source) -> bool {
        source.as_text().is_some_and(|text| RE_BANNER.is_match(text))
    }

    fn parse_metadata(&self, source: &Source) -> Result<Metadata, ReportError> {
        let text = source.require_text()?;
        let version = first_version(&RE_BANNER, text).unwrap_or_default();
        GATE.check(self.source_tool(), &version)?;

        Ok(Metadata::new(version)
            .with("date", first_version(&RE_DATE, text))
            .with("target", target(text).map(String::from)))
    }

    fn parse_report(&self, source: &Source) -> Result<Vec<Vulnerability>, ReportError> {
        let text = source.require_text()?;
        let ranking = self.map_severity(DISCOVERY)?;
        let target = target(text);

        let mut vulns = Vec::new();
        for caps in RE_SECTION.captures_iter(text) {
            let kind = if &caps[1] == "Dirs" { "directory" } else { "file" };
            let status = caps[2].parse::<u16>().ok();
            let Some(heading) = caps.get(0) else {
                continue;
            };

            for path in listed_paths(&text[heading.end()..]) {
                vulns.push(Vulnerability {
                    ranking,
                    original_severity: DISCOVERY.to_string(),
                    name: Some(path.to_string()),
                    details: serde_json::json!({
                        "target": target,
                        "path": path,
                        "kind": kind,
                        "status_code": status,
                    }),
                });
            }
        }

        tracing::debug!(count = vulns.len(), "Parsed DirBuster paths");
        Ok(vulns)
    }
}

/// First URL line after the banner block.
fn target(text: &str) -> Option<&str> {
    let after_banner = RE_SEPARATOR.find(text).map(|m| &text[m.end()..])?;
    RE_TARGET
        .captures(after_banner)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Paths listed right after a section heading, up to the first non-path line.
fn listed_paths(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| line.starts_with('/'))
        .collect()
}
