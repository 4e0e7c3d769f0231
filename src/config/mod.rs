use std::env;
use std::path::PathBuf;

use crate::services::orchestrator::ParseOptions;

/// Scan configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub report_dirs: Vec<PathBuf>,
    pub filename: Option<String>,
    pub recursive: bool,
    pub first_only: bool,
    pub light: bool,
}

impl ScanConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            report_dirs: env::var("REPORT_DIRS")?
                .split(',')
                .map(str::trim)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .collect(),
            filename: env::var("REPORT_FILENAME").ok().filter(|f| !f.trim().is_empty()),
            recursive: env_flag("REPORT_RECURSIVE", true),
            first_only: env_flag("REPORT_FIRST_ONLY", true),
            light: env_flag("REPORT_LIGHT", false),
        })
    }

    /// Options handed to every orchestration call.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            filename: self.filename.clone(),
            recursive: self.recursive,
            first_only: self.first_only,
            light: self.light,
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn parse_options_mirror_config() {
        let config = ScanConfig {
            report_dirs: vec![PathBuf::from("/reports")],
            filename: Some("*.xml".to_string()),
            recursive: false,
            first_only: false,
            light: true,
        };
        let options = config.parse_options();
        assert_eq!(options.filename.as_deref(), Some("*.xml"));
        assert!(!options.recursive);
        assert!(!options.first_only);
        assert!(options.light);
    }
}
