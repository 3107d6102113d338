use crate::normalization::Profile;
use crate::util::env::env_opt;

/// Destination table names. Defaults match the production schema; each can be
/// overridden from the environment (useful against a staging copy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub viral_content: String,
    pub viral_videos: String,
    pub hook_patterns: String,
    pub industries: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            viral_content: Profile::ViralContent.default_table().to_string(),
            viral_videos: Profile::ScrapedVideo.default_table().to_string(),
            hook_patterns: Profile::HookPattern.default_table().to_string(),
            industries: "industries".to_string(),
        }
    }
}

impl Tables {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            viral_content: env_opt("VIRAL_CONTENT_TABLE").unwrap_or(d.viral_content),
            viral_videos: env_opt("VIRAL_VIDEOS_TABLE").unwrap_or(d.viral_videos),
            hook_patterns: env_opt("HOOK_PATTERNS_TABLE").unwrap_or(d.hook_patterns),
            industries: env_opt("INDUSTRIES_TABLE").unwrap_or(d.industries),
        }
    }

    pub fn table_for(&self, profile: Profile) -> &str {
        match profile {
            Profile::ScrapedVideo => &self.viral_videos,
            Profile::ViralContent => &self.viral_content,
            Profile::HookPattern => &self.hook_patterns,
        }
    }

    /// Resolve a user-supplied table name (configured or default spelling).
    pub fn profile_for(&self, table: &str) -> Option<Profile> {
        let wanted = table.trim();
        Profile::ALL
            .into_iter()
            .find(|p| self.table_for(*p) == wanted || p.default_table() == wanted)
    }

    /// Writable tables, as offered in prompts.
    pub fn writable(&self) -> Vec<&str> {
        Profile::ALL.into_iter().map(|p| self.table_for(p)).collect()
    }
}
