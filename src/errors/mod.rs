//! Unified error type for report loading, detection and normalization.

use std::path::PathBuf;

/// Errors surfaced by an orchestration call.
///
/// "No adapter claims this file" is not an error; it is reported as an
/// empty [`Report`](crate::models::report::Report).
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Unreadable source {}: {source}", .path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed source {}: {message}", .path.display())]
    MalformedSource { path: PathBuf, message: String },

    #[error("Unsupported {tool} version: '{version}'")]
    UnsupportedVersion { tool: String, version: String },

    #[error("Unknown {tool} severity: '{severity}'")]
    UnknownSeverity { tool: String, severity: String },
}

impl ReportError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedSource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the file is not well-formed for its format.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedSource { .. })
    }

    /// Check if this error is a version gate rejection.
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, Self::UnsupportedVersion { .. })
    }

    /// Check if this error is an unmapped native severity.
    pub fn is_unknown_severity(&self) -> bool {
        matches!(self, Self::UnknownSeverity { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_version_display() {
        let err = ReportError::UnsupportedVersion {
            tool: "w3af".to_string(),
            version: "2.0.0.0".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported w3af version: '2.0.0.0'");
        assert!(err.is_unsupported_version());
        assert!(!err.is_malformed());
    }

    #[test]
    fn unknown_severity_display() {
        let err = ReportError::UnknownSeverity {
            tool: "w3af".to_string(),
            severity: "Critical".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown w3af severity: 'Critical'");
        assert!(err.is_unknown_severity());
    }

    #[test]
    fn malformed_display_includes_path() {
        let err = ReportError::malformed("/tmp/report.xml", "no root element");
        assert_eq!(
            err.to_string(),
            "Malformed source /tmp/report.xml: no root element"
        );
        assert!(err.is_malformed());
    }

    #[test]
    fn unreadable_keeps_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ReportError::UnreadableSource {
            path: PathBuf::from("/tmp/missing.xml"),
            source: io,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("Unreadable source /tmp/missing.xml"));
    }
}
