use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strsim::jaro_winkler;

/// Minimum similarity score (Jaro-Winkler) required for a typed label to be
/// accepted as a known platform.
pub const MIN_PLATFORM_SIMILARITY: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Tiktok,
    Instagram,
}

const ALIASES: [(&str, Platform); 5] = [
    ("tiktok", Platform::Tiktok),
    ("tt", Platform::Tiktok),
    ("instagram", Platform::Instagram),
    ("ig", Platform::Instagram),
    ("insta", Platform::Instagram),
];

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
        }
    }

    /// Match a user-typed label such as "TikTok", "Tik Tok", "IG" or a
    /// near-miss like "instagarm".
    ///
    /// Normalization steps:
    /// - lowercase and keep ASCII alphanumerics only
    /// - exact alias lookup
    /// - otherwise the closest full platform name above the similarity floor
    pub fn from_label(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if key.is_empty() {
            return None;
        }
        if let Some((_, p)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
            return Some(*p);
        }
        [Platform::Tiktok, Platform::Instagram]
            .into_iter()
            .map(|p| (p, jaro_winkler(&key, p.as_str())))
            .filter(|(_, score)| *score >= MIN_PLATFORM_SIMILARITY)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, _)| p)
    }

    /// Infer the platform from a post URL's host.
    pub fn from_url(raw: &str) -> Option<Self> {
        let parsed = url::Url::parse(raw.trim()).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if host == "tiktok.com" || host.ends_with(".tiktok.com") {
            Some(Platform::Tiktok)
        } else if host == "instagram.com" || host.ends_with(".instagram.com") {
            Some(Platform::Instagram)
        } else {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::from_label(s).ok_or_else(|| anyhow::anyhow!("unknown platform {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_case_and_punctuation() {
        assert_eq!(Platform::from_label("TikTok"), Some(Platform::Tiktok));
        assert_eq!(Platform::from_label(" Tik-Tok "), Some(Platform::Tiktok));
        assert_eq!(Platform::from_label("IG"), Some(Platform::Instagram));
    }

    #[test]
    fn accepts_near_misses_only_above_threshold() {
        assert_eq!(Platform::from_label("instagarm"), Some(Platform::Instagram));
        assert_eq!(Platform::from_label("youtube"), None);
        assert_eq!(Platform::from_label(""), None);
    }

    #[test]
    fn infers_platform_from_url_host() {
        assert_eq!(
            Platform::from_url("https://www.tiktok.com/@user/video/123"),
            Some(Platform::Tiktok)
        );
        assert_eq!(
            Platform::from_url("https://vm.tiktok.com/ZMabc/"),
            Some(Platform::Tiktok)
        );
        assert_eq!(
            Platform::from_url("https://instagram.com/reel/abc"),
            Some(Platform::Instagram)
        );
        assert_eq!(Platform::from_url("https://example.com/x"), None);
        assert_eq!(Platform::from_url("not a url"), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Platform::Instagram).unwrap(),
            serde_json::json!("instagram")
        );
    }
}
