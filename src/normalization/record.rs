use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{FieldSpec, HOOK_PATTERN_FIELDS, SCRAPED_VIDEO_FIELDS, VIRAL_CONTENT_FIELDS};

/// Loosely typed record as read from a file, a paste buffer or a scraper.
pub type RawRecord = Map<String, Value>;

/// Which destination shape a raw record is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Scraper output bound for `viral_videos`.
    ScrapedVideo,
    /// Curated entries bound for `viral_content`.
    ViralContent,
    /// Templates bound for `hook_patterns`.
    HookPattern,
}

impl Profile {
    pub const ALL: [Profile; 3] = [
        Profile::ViralContent,
        Profile::ScrapedVideo,
        Profile::HookPattern,
    ];

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Profile::ScrapedVideo => SCRAPED_VIDEO_FIELDS,
            Profile::ViralContent => VIRAL_CONTENT_FIELDS,
            Profile::HookPattern => HOOK_PATTERN_FIELDS,
        }
    }

    /// Table name used when no override is configured.
    pub fn default_table(self) -> &'static str {
        match self {
            Profile::ScrapedVideo => "viral_videos",
            Profile::ViralContent => "viral_content",
            Profile::HookPattern => "hook_patterns",
        }
    }
}

/// Whether the profile's column defaults are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPolicy {
    #[default]
    Fill,
    /// Rename and drop only.
    MappingOnly,
}

/// A record keyed by destination column names. Absent and null fields are
/// never present, so the remote column defaults apply to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalRecord(IndexMap<&'static str, Value>);

impl CanonicalRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn url(&self) -> Option<&str> {
        self.get("url").and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Row payload for the remote store, keeping column order.
    pub fn into_row(self) -> RawRecord {
        self.0
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

/// Normalization result plus the keys that had no column to go to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub record: CanonicalRecord,
    pub dropped: Vec<String>,
}

/// Maps raw records onto one profile's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    profile: Profile,
    policy: DefaultPolicy,
}

impl Normalizer {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            policy: DefaultPolicy::Fill,
        }
    }

    pub fn with_policy(mut self, policy: DefaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn normalize(&self, raw: &RawRecord, today: NaiveDate) -> CanonicalRecord {
        self.normalize_with_diagnostics(raw, today).record
    }

    /// Rename known keys, fill defaults per policy, drop nulls and unknown
    /// keys. Values are forwarded as-is; no type coercion happens here.
    pub fn normalize_with_diagnostics(&self, raw: &RawRecord, today: NaiveDate) -> Normalized {
        let fields = self.profile.fields();
        let mut out = IndexMap::with_capacity(fields.len());
        for spec in fields {
            let value = match (lookup(raw, spec), spec.default, self.policy) {
                (Some(v), _, _) => Some(v.clone()),
                (None, Some(default), DefaultPolicy::Fill) => Some(default.value(today)),
                (None, _, _) => None,
            };
            if let Some(v) = value {
                out.insert(spec.column, v);
            }
        }
        let dropped = raw
            .keys()
            .filter(|k| !fields.iter().any(|f| f.matches(k)))
            .cloned()
            .collect();
        Normalized {
            record: CanonicalRecord(out),
            dropped,
        }
    }
}

// External name wins over the column name when both are present.
fn lookup<'a>(raw: &'a RawRecord, spec: &FieldSpec) -> Option<&'a Value> {
    let non_null = |key: &str| raw.get(key).filter(|v| !v.is_null());
    non_null(spec.external).or_else(|| non_null(spec.column))
}
