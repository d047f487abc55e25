//! Base image and FIPS classification
//!
//! Turns the output of the diagnostic command into a base-type tag and a
//! compliance flag. Matching is case-insensitive throughout.

use crate::config::ClassifierConfig;
use crate::discovery::inspector::InspectionResult;
use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const OTHER: &str = "Other";

const IDENTITY_KEYS: [&str; 2] = ["id", "name"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub base_type: String,
    pub compliant: bool,
}

#[derive(Debug, Clone)]
struct Rule {
    tag: String,
    patterns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    markers: Vec<String>,
    image_tokens: Vec<String>,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let lower = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .filter(|v| !v.is_empty())
                .map(|v| v.to_lowercase())
                .collect()
        };

        Self {
            rules: config
                .base_types
                .iter()
                .map(|rule| Rule {
                    tag: rule.tag.clone(),
                    patterns: lower(&rule.patterns),
                })
                .collect(),
            markers: lower(&config.compliance_markers),
            image_tokens: lower(&config.compliant_image_tokens),
        }
    }

    pub fn classify(&self, inspection: &InspectionResult) -> Classification {
        match inspection {
            InspectionResult::Failed { image, .. } => Classification {
                base_type: UNKNOWN.to_string(),
                compliant: self.image_indicates_compliance(image),
            },
            InspectionResult::Content { image, content } => Classification {
                base_type: self.base_type(content),
                // The image check runs even when the content is conclusive.
                compliant: self.content_indicates_compliance(content)
                    | self.image_indicates_compliance(image),
            },
        }
    }

    pub fn base_type(&self, content: &str) -> String {
        let Some(value) = identity_value(content) else {
            return UNKNOWN.to_string();
        };

        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| value.contains(p.as_str())))
            .map(|rule| rule.tag.clone())
            .unwrap_or_else(|| OTHER.to_string())
    }

    pub fn content_indicates_compliance(&self, content: &str) -> bool {
        let content = content.to_lowercase();
        self.markers.iter().any(|m| content.contains(m.as_str()))
    }

    pub fn image_indicates_compliance(&self, image: &str) -> bool {
        let image = image.to_lowercase();
        self.image_tokens.iter().any(|t| image.contains(t.as_str()))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

/// Lowercased, unquoted value of the first `ID=` or `NAME=` line.
fn identity_value(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if !IDENTITY_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        Some(value.to_lowercase())
    })
}
