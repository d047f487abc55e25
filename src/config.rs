//! Runtime configuration
//!
//! Every field has a default, so an empty or partial YAML document is valid.
//! CLI flags are applied on top of the loaded file by the command handlers.

use crate::{PodscanError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_LISTEN_PORT: u16 = 8080;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_port: u16,
    pub poll_interval_secs: u64,
    pub max_concurrent_inspections: usize,
    pub exec_timeout_secs: u64,
    pub cycle_timeout_secs: u64,
    pub inspect_command: Vec<String>,
    pub classifier: ClassifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_concurrent_inspections: 8,
            exec_timeout_secs: 10,
            cycle_timeout_secs: 300,
            inspect_command: vec!["cat".to_string(), "/etc/os-release".to_string()],
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Rules used to turn `/etc/os-release` content and image references into a
/// classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Checked in order; the first rule with a matching pattern wins.
    pub base_types: Vec<BaseTypeRule>,
    pub compliance_markers: Vec<String>,
    pub compliant_image_tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseTypeRule {
    pub tag: String,
    pub patterns: Vec<String>,
}

impl BaseTypeRule {
    fn new(tag: &str, patterns: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_types: vec![
                BaseTypeRule::new("Ubuntu", &["ubuntu"]),
                BaseTypeRule::new("Debian", &["debian"]),
                BaseTypeRule::new("Alpine", &["alpine"]),
                BaseTypeRule::new("RHEL", &["rhel", "centos", "ubi", "red hat"]),
                BaseTypeRule::new("Fedora", &["fedora"]),
                BaseTypeRule::new("Chainguard", &["wolfi", "chainguard"]),
            ],
            compliance_markers: vec!["fips_mode=yes".to_string(), "fips=1".to_string()],
            compliant_image_tokens: vec![
                "fips".to_string(),
                "ubi8-fips".to_string(),
                "debian:fips".to_string(),
                "chainguard:fips".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or return defaults when no path
    /// is given. The result is not validated; callers apply overrides first
    /// and then call `validate`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    PodscanError::ConfigError(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_yaml(&contents)?
            }
            None => Self::default(),
        };

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(contents)
            .map_err(|e| PodscanError::ConfigError(format!("Invalid config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(PodscanError::ConfigError(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.exec_timeout_secs == 0 || self.cycle_timeout_secs == 0 {
            return Err(PodscanError::ConfigError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_inspections == 0 {
            return Err(PodscanError::ConfigError(
                "max_concurrent_inspections must be at least 1".to_string(),
            ));
        }
        if self.inspect_command.is_empty() {
            return Err(PodscanError::ConfigError(
                "inspect_command must not be empty".to_string(),
            ));
        }

        for rule in &self.classifier.base_types {
            if rule.tag.trim().is_empty() {
                return Err(PodscanError::ConfigError(
                    "base type rule with empty tag".to_string(),
                ));
            }
            if rule.patterns.iter().all(|p| p.is_empty()) {
                return Err(PodscanError::ConfigError(format!(
                    "base type rule {} has no patterns",
                    rule.tag
                )));
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.inspect_command, vec!["cat", "/etc/os-release"]);
    }

    #[test]
    fn test_load_without_path_returns_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_secs: 15").unwrap();
        writeln!(file, "classifier:").unwrap();
        writeln!(file, "  compliance_markers: [\"crypto_policy=fips\"]").unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.listen_port, DEFAULT_LISTEN_PORT);
        assert_eq!(config.classifier.compliance_markers, vec!["crypto_policy=fips"]);
        assert_eq!(
            config.classifier.base_types,
            ClassifierConfig::default().base_types
        );
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = Config {
            max_concurrent_inspections: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PodscanError::ConfigError(_)));
    }

    #[test]
    fn test_load_defers_validation_to_caller() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent_inspections: 0").unwrap();

        let mut config = Config::load(Some(file.path())).unwrap();
        assert!(config.validate().is_err());

        config.max_concurrent_inspections = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_rule_without_patterns() {
        let yaml = "classifier:\n  base_types:\n    - tag: Empty\n      patterns: []\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/podscan.yaml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/podscan.yaml"));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = Config::from_yaml("listen_port: [not, a, port]").unwrap_err();
        assert!(matches!(err, PodscanError::ConfigError(_)));
    }
}
