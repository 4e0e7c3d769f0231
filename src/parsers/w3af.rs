//! w3af web application scanner XML report adapter.
//!
//! Ownership is signalled by a `<w3af-version>` element. Its free-text body
//! carries the version (`Version: 1.6.0.2`), which is gated before any
//! `<vulnerability>` node is read. Each vulnerability maps its `severity`
//! attribute through the w3af vocabulary.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ReportError;
use crate::models::ranking::{Ranking, RankingScale};
use crate::models::report::{Metadata, Vulnerability};
use crate::parsers::version::first_version;
use crate::parsers::{
    epoch_to_rfc3339, non_empty, FormatKind, Parser, ParserDescriptor, Source, VersionGate,
    VersionSpec,
};

const DESCRIPTOR: ParserDescriptor = ParserDescriptor {
    tool: "w3af",
    format: FormatKind::Xml,
    default_filename: "*.xml",
    supported_versions: VersionSpec::Pattern(
        r"^1\.6(\.0\.[1-5]|\.(45|46|49|50|51|52|54))?$",
    ),
    ranking_scale: RankingScale::new(
        "w3af",
        &[
            ("High", Ranking::High),
            ("Medium", Ranking::Medium),
            ("Low", Ranking::Low),
            ("Information", Ranking::Info),
        ],
    ),
    http_log_filename: Some("*.http.txt"),
};

static GATE: Lazy<VersionGate> = Lazy::new(|| {
    VersionGate::new(&DESCRIPTOR.supported_versions).expect("valid w3af version pattern")
});

static RE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Version: (\S+)").expect("valid w3af version regex"));

/// Parser for w3af XML reports.
#[derive(Debug, Default)]
pub struct W3afParser;

impl W3afParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for W3afParser {
    fn descriptor(&self) -> &ParserDescriptor {
        &DESCRIPTOR
    }

    fn is_mine(&self, source: &Source) -> bool {
        source
            .as_xml()
            .is_some_and(|root| root.find("w3af-version").is_some())
    }

    fn parse_metadata(&self, source: &Source) -> Result<Metadata, ReportError> {
        let root = source.require_xml()?;
        let raw = root
            .find("w3af-version")
            .ok_or_else(|| ReportError::malformed(source.path(), "missing <w3af-version>"))?
            .raw_text();

        let version = first_version(&RE_VERSION, raw).unwrap_or_default();
        GATE.check(self.source_tool(), &version)?;

        let target = root
            .find("scan-info")
            .and_then(|info| info.attr("target"))
            .map(String::from);

        Ok(Metadata::new(version)
            .with("start", root.attr("start").and_then(epoch_to_rfc3339))
            .with("target", target))
    }

    fn parse_report(&self, source: &Source) -> Result<Vec<Vulnerability>, ReportError> {
        let root = source.require_xml()?;
        root.find_all("vulnerability")
            .into_iter()
            .map(|node| {
                let severity = node.attr("severity").unwrap_or_default();
                let ranking = self.map_severity(severity)?;
                let description = node.child("description").map(|d| d.text());

                Ok(Vulnerability {
                    ranking,
                    original_severity: severity.to_string(),
                    name: node.attr("name").map(String::from),
                    details: serde_json::json!({
                        "id": node.attr("id"),
                        "plugin": node.attr("plugin"),
                        "url": node.attr("url"),
                        "method": node.attr("method"),
                        "var": node.attr("var").and_then(non_empty),
                        "description": description,
                    }),
                })
            })
            .collect()
    }
}
