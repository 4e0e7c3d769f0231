//! Version gate: blocks finding extraction for unsupported tool versions.

use regex::{Regex, RegexBuilder};

use crate::errors::ReportError;

/// How an adapter declares the versions it supports.
#[derive(Debug, Clone, Copy)]
pub enum VersionSpec {
    /// Exact version strings.
    Exact(&'static [&'static str]),
    /// Regular expression searched case-insensitively in the version.
    Pattern(&'static str),
}

/// Compiled predicate over extracted version strings.
#[derive(Debug, Clone)]
pub enum VersionGate {
    Exact(Vec<String>),
    Pattern(Regex),
}

impl VersionGate {
    pub fn new(spec: &VersionSpec) -> Result<Self, regex::Error> {
        match spec {
            VersionSpec::Exact(versions) => Ok(Self::Exact(
                versions.iter().map(|v| v.to_string()).collect(),
            )),
            VersionSpec::Pattern(pattern) => Ok(Self::Pattern(
                RegexBuilder::new(pattern).case_insensitive(true).build()?,
            )),
        }
    }

    pub fn supports(&self, version: &str) -> bool {
        match self {
            Self::Exact(versions) => versions.iter().any(|v| v == version),
            Self::Pattern(re) => re.is_match(version),
        }
    }

    /// Reject the version with the tool name attached for diagnostics.
    pub fn check(&self, tool: &str, version: &str) -> Result<(), ReportError> {
        if self.supports(version) {
            Ok(())
        } else {
            tracing::debug!(tool, version, "Version gate rejected report");
            Err(ReportError::UnsupportedVersion {
                tool: tool.to_string(),
                version: version.to_string(),
            })
        }
    }
}

/// First capture of `re` in `text`.
///
/// When the text carries several versions the first one is authoritative.
pub fn first_version(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
