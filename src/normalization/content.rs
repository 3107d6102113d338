use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fields::DEFAULT_FORMAT;
use super::platform::Platform;
use super::record::RawRecord;

/// Niches the dashboard groups by. Free-form values are still accepted.
pub const SUGGESTED_NICHES: &[&str] = &[
    "Fitness",
    "Business/Finance",
    "Lifestyle",
    "Beauty/Skincare",
    "Food/Cooking",
    "Fashion",
    "Tech/Gaming",
];

pub const DEFAULT_NICHE: &str = "Fitness";

/// Tidy a typed niche: compound niches ("Beauty/Skincare") are kept as typed,
/// single words get a leading capital. A case-insensitive match against the
/// suggested list snaps to the canonical spelling.
pub fn normalize_niche(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(known) = SUGGESTED_NICHES
        .iter()
        .find(|n| n.eq_ignore_ascii_case(trimmed))
    {
        return (*known).to_string();
    }
    if trimmed.contains('/') {
        return trimmed.to_string();
    }
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One hand-entered `viral_content` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub platform: Platform,
    pub url: String,
    pub views: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers_at_time: Option<u64>,
    pub date_posted: NaiveDate,
    pub niche: String,
    pub format_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_hook_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbal_hook_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_hook_text: Option<String>,
}

impl ContentEntry {
    pub fn new(platform: Platform, url: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            platform,
            url: url.into(),
            views: 0,
            followers_at_time: None,
            date_posted: today,
            niche: DEFAULT_NICHE.to_string(),
            format_type: DEFAULT_FORMAT.to_string(),
            hook_text: None,
            visual_hook_desc: None,
            verbal_hook_text: None,
            written_hook_text: None,
        }
    }

    /// Views per follower at posting time; `None` without a follower count.
    pub fn viral_ratio(&self) -> Option<f64> {
        match self.followers_at_time {
            Some(f) if f > 0 => Some(self.views as f64 / f as f64),
            _ => None,
        }
    }

    pub fn to_raw(&self) -> anyhow::Result<RawRecord> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(anyhow::anyhow!("content entry serialized to {other}")),
        }
    }
}

/// Blank text means "not provided".
pub fn non_empty(s: impl AsRef<str>) -> Option<String> {
    let t = s.as_ref().trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
