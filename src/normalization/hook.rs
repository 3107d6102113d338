use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::record::RawRecord;

/// Closed set of hook pattern categories accepted by `hook_patterns.category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HookCategory {
    #[default]
    Relatable,
    Humor,
    Suspense,
    Educational,
    Listicle,
    Series,
    Tutorial,
    Opinion,
    Tips,
    Transformation,
    Story,
    Engagement,
}

impl HookCategory {
    pub const ALL: [HookCategory; 12] = [
        HookCategory::Relatable,
        HookCategory::Humor,
        HookCategory::Suspense,
        HookCategory::Educational,
        HookCategory::Listicle,
        HookCategory::Series,
        HookCategory::Tutorial,
        HookCategory::Opinion,
        HookCategory::Tips,
        HookCategory::Transformation,
        HookCategory::Story,
        HookCategory::Engagement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookCategory::Relatable => "Relatable",
            HookCategory::Humor => "Humor",
            HookCategory::Suspense => "Suspense",
            HookCategory::Educational => "Educational",
            HookCategory::Listicle => "Listicle",
            HookCategory::Series => "Series",
            HookCategory::Tutorial => "Tutorial",
            HookCategory::Opinion => "Opinion",
            HookCategory::Tips => "Tips",
            HookCategory::Transformation => "Transformation",
            HookCategory::Story => "Story",
            HookCategory::Engagement => "Engagement",
        }
    }
}

impl fmt::Display for HookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HookCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow::anyhow!("unknown hook category {wanted:?}"))
    }
}

/// One `hook_patterns` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookPattern {
    pub template: String,
    pub category: HookCategory,
    pub occurrence_frequency: u32,
    pub avg_viral_ratio: f64,
    pub sample_size: u32,
    pub confidence_level: f64,
}

impl HookPattern {
    /// A pattern seen once, with no ratio or confidence recorded yet.
    pub fn new(template: impl Into<String>, category: HookCategory) -> Self {
        Self {
            template: template.into(),
            category,
            occurrence_frequency: 1,
            avg_viral_ratio: 0.0,
            sample_size: 1,
            confidence_level: 0.0,
        }
    }

    /// Every observation counts as one occurrence.
    pub fn with_sample_size(mut self, n: u32) -> Self {
        self.sample_size = n;
        self.occurrence_frequency = n;
        self
    }

    pub fn placeholders(&self) -> Vec<&str> {
        placeholders(&self.template)
    }

    pub fn to_raw(&self) -> anyhow::Result<RawRecord> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(anyhow::anyhow!("hook pattern serialized to {other}")),
        }
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex"))
}

/// `{name}` tokens in a template, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for cap in placeholder_re().captures_iter(template) {
        if let Some(m) = cap.get(1) {
            if !out.contains(&m.as_str()) {
                out.push(m.as_str());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("humor".parse::<HookCategory>().unwrap(), HookCategory::Humor);
        assert_eq!(" Story ".parse::<HookCategory>().unwrap(), HookCategory::Story);
        assert!("Clickbait".parse::<HookCategory>().is_err());
    }

    #[test]
    fn extracts_unique_placeholders_in_order() {
        assert_eq!(
            placeholders("POV: You're {situation} and {unexpected_outcome} ({situation})"),
            vec!["situation", "unexpected_outcome"]
        );
        assert!(placeholders("no tokens { here }").is_empty());
    }

    #[test]
    fn sample_size_sets_frequency() {
        let p = HookPattern::new("Wait for it... {surprise_reveal}", HookCategory::Suspense)
            .with_sample_size(150);
        assert_eq!(p.sample_size, 150);
        assert_eq!(p.occurrence_frequency, 150);
    }

    #[test]
    fn serializes_to_table_columns() {
        let p = HookPattern::new("t {x}", HookCategory::Tips);
        let raw = p.to_raw().unwrap();
        assert_eq!(
            serde_json::Value::Object(raw),
            json!({
                "template": "t {x}",
                "category": "Tips",
                "occurrence_frequency": 1,
                "avg_viral_ratio": 0.0,
                "sample_size": 1,
                "confidence_level": 0.0,
            })
        );
    }
}
