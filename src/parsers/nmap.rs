//! Nmap XML report adapter.
//!
//! One discovery per `<host>`. Nmap does not rank its results, so every
//! discovery carries the informational literal.

use once_cell::sync::Lazy;

use crate::errors::ReportError;
use crate::models::ranking::{Ranking, RankingScale};
use crate::models::report::{Metadata, Vulnerability};
use crate::parsers::source::XmlElement;
use crate::parsers::{
    epoch_to_rfc3339, FormatKind, Parser, ParserDescriptor, Source, VersionGate, VersionSpec,
};

/// Native literal attached to every host discovery.
const DISCOVERY: &str = "info";

const DESCRIPTOR: ParserDescriptor = ParserDescriptor {
    tool: "nmap",
    format: FormatKind::Xml,
    default_filename: "*.xml",
    supported_versions: VersionSpec::Pattern(r"^[67]\.\d+"),
    ranking_scale: RankingScale::new("nmap", &[(DISCOVERY, Ranking::Info)]),
    http_log_filename: None,
};

static GATE: Lazy<VersionGate> = Lazy::new(|| {
    VersionGate::new(&DESCRIPTOR.supported_versions).expect("valid nmap version pattern")
});

/// Parser for Nmap `-oX` output.
#[derive(Debug, Default)]
pub struct NmapParser;

impl NmapParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for NmapParser {
    fn descriptor(&self) -> &ParserDescriptor {
        &DESCRIPTOR
    }

    fn is_mine(&self, source: &Source) -> bool {
        source
            .as_xml()
            .is_some_and(|root| root.name == "nmaprun" && root.attr("scanner") == Some("nmap"))
    }

    fn parse_metadata(&self, source: &Source) -> Result<Metadata, ReportError> {
        let root = source.require_xml()?;
        let version = root.attr("version").unwrap_or_default().trim().to_string();
        GATE.check(self.source_tool(), &version)?;

        Ok(Metadata::new(version)
            .with("args", root.attr("args").map(String::from))
            .with("start", root.attr("start").and_then(epoch_to_rfc3339)))
    }

    fn parse_report(&self, source: &Source) -> Result<Vec<Vulnerability>, ReportError> {
        let root = source.require_xml()?;
        let ranking = self.map_severity(DISCOVERY)?;
        Ok(root
            .children_named("host")
            .map(|host| Vulnerability {
                ranking,
                original_severity: DISCOVERY.to_string(),
                name: host_address(host).map(String::from),
                details: host_details(host),
            })
            .collect())
    }
}

/// Prefer the IPv4/IPv6 address over a MAC address.
fn host_address(host: &XmlElement) -> Option<&str> {
    let mut addresses = host.children_named("address");
    let first = addresses.next()?;
    if first.attr("addrtype") == Some("mac") {
        if let Some(ip) = host
            .children_named("address")
            .find(|a| a.attr("addrtype") != Some("mac"))
        {
            return ip.attr("addr");
        }
    }
    first.attr("addr")
}

fn host_details(host: &XmlElement) -> serde_json::Value {
    let hostnames: Vec<&str> = host
        .find_all("hostname")
        .into_iter()
        .filter_map(|h| h.attr("name"))
        .collect();

    let ports: Vec<serde_json::Value> = host
        .find_all("port")
        .into_iter()
        .map(|port| {
            let service = port.child("service");
            serde_json::json!({
                "protocol": port.attr("protocol"),
                "port": port.attr("portid").and_then(|p| p.parse::<u16>().ok()),
                "state": port.child("state").and_then(|s| s.attr("state")),
                "service": service.and_then(|s| s.attr("name")),
                "product": service.and_then(|s| s.attr("product")),
                "version": service.and_then(|s| s.attr("version")),
            })
        })
        .collect();

    serde_json::json!({
        "address": host_address(host),
        "status": host.child("status").and_then(|s| s.attr("state")),
        "hostnames": hostnames,
        "ports": ports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::source::parse_xml;
    use std::path::Path;

    fn source(text: &str) -> Source {
        Source::Xml {
            path: "nmap.xml".into(),
            root: parse_xml(Path::new("nmap.xml"), text).unwrap(),
        }
    }

    fn fixture() -> Source {
        source(include_str!("../../tests/fixtures/nmap_report.xml"))
    }

    #[test]
    fn claims_nmaprun_root() {
        assert!(NmapParser::new().is_mine(&fixture()));
        assert!(!NmapParser::new().is_mine(&source("<run scanner=\"nmap\"/>")));
        assert!(!NmapParser::new().is_mine(&source("<nmaprun scanner=\"masscan\"/>")));
    }

    #[test]
    fn metadata_from_fixture() {
        let metadata = NmapParser::new().parse_metadata(&fixture()).unwrap();
        assert_eq!(metadata.version, "6.46");
        assert_eq!(metadata.extra["start"], "2014-05-12T10:12:53+00:00");
        assert!(metadata.extra["args"].starts_with("nmap -sV"));
    }

    #[test]
    fn version_gate() {
        let parser = NmapParser::new();
        for version in ["6.40", "7.80", "7.94SVN"] {
            let src = source(&format!(r#"<nmaprun scanner="nmap" version="{version}"/>"#));
            assert_eq!(parser.parse_metadata(&src).unwrap().version, version);
        }
        for version in ["5.21", "8.0", ""] {
            let src = source(&format!(r#"<nmaprun scanner="nmap" version="{version}"/>"#));
            assert!(parser.parse_metadata(&src).unwrap_err().is_unsupported_version());
        }
    }

    #[test]
    fn one_discovery_per_host() {
        let vulns = NmapParser::new().parse_report(&fixture()).unwrap();
        assert_eq!(vulns.len(), 2);
        assert!(vulns.iter().all(|v| v.ranking == Ranking::Info));
        assert_eq!(vulns[0].name.as_deref(), Some("192.168.1.1"));
        assert_eq!(vulns[0].details["hostnames"][0], "router.lan");
        assert_eq!(vulns[0].details["ports"].as_array().unwrap().len(), 3);
        assert_eq!(vulns[0].details["ports"][0]["port"], 22);
        assert_eq!(vulns[0].details["ports"][0]["service"], "ssh");
        assert_eq!(vulns[1].details["status"], "up");
    }

    #[test]
    fn prefers_ip_over_mac() {
        let src = source(
            r#"<nmaprun scanner="nmap" version="7.80"><host>
<address addr="00:11:22:33:44:55" addrtype="mac"/>
<address addr="10.0.0.5" addrtype="ipv4"/></host></nmaprun>"#,
        );
        let vulns = NmapParser::new().parse_report(&src).unwrap();
        assert_eq!(vulns[0].name.as_deref(), Some("10.0.0.5"));
    }
}
