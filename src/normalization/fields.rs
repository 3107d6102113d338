//! Column maps from scraper / spreadsheet field names to table columns.
//!
//! Each table gets an ordered list of [`FieldSpec`]s. The order is the column
//! order of the normalized record, so payloads and generated SQL stay stable.

use chrono::NaiveDate;
use serde_json::Value;

/// Value substituted when a mapped field is absent or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// Integer zero, used by count columns.
    Zero,
    /// A fixed text value.
    Text(&'static str),
    /// The ingestion date as `YYYY-MM-DD`.
    Today,
}

impl FieldDefault {
    pub fn value(self, today: NaiveDate) -> Value {
        match self {
            FieldDefault::Zero => Value::from(0),
            FieldDefault::Text(s) => Value::from(s),
            FieldDefault::Today => Value::from(today.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key used by scrapers and spreadsheets (camelCase).
    pub external: &'static str,
    /// Destination column.
    pub column: &'static str,
    pub default: Option<FieldDefault>,
}

impl FieldSpec {
    const fn plain(external: &'static str, column: &'static str) -> Self {
        Self {
            external,
            column,
            default: None,
        }
    }

    const fn defaulted(
        external: &'static str,
        column: &'static str,
        default: FieldDefault,
    ) -> Self {
        Self {
            external,
            column,
            default: Some(default),
        }
    }

    /// Whether `key` names this field, either by its external name or by the
    /// column name itself.
    pub fn matches(&self, key: &str) -> bool {
        key == self.external || key == self.column
    }
}

pub const DEFAULT_FORMAT: &str = "video";

/// `viral_videos`: records produced by the Instagram/TikTok scraper.
pub const SCRAPED_VIDEO_FIELDS: &[FieldSpec] = &[
    FieldSpec::plain("inputUrl", "input_url"),
    FieldSpec::plain("url", "url"),
    FieldSpec::defaulted("likesCount", "likes_count", FieldDefault::Zero),
    FieldSpec::defaulted("videoPlayCount", "video_play_count", FieldDefault::Zero),
    FieldSpec::defaulted("videoViewCount", "video_view_count", FieldDefault::Zero),
    FieldSpec::plain("videoDuration", "video_duration"),
    FieldSpec::plain("timestamp", "timestamp"),
    FieldSpec::defaulted("commentsCount", "comments_count", FieldDefault::Zero),
    FieldSpec::plain("industry", "industry"),
    FieldSpec::plain("thumbnail", "thumbnail"),
    FieldSpec::defaulted("postType", "post_type", FieldDefault::Text(DEFAULT_FORMAT)),
    FieldSpec::plain("hook", "hook"),
    FieldSpec::plain("visualHookType", "visual_hook_type"),
    FieldSpec::plain("audioHookType", "audio_hook_type"),
    FieldSpec::plain("writtenHookType", "written_hook_type"),
    FieldSpec::plain("dateInserted", "date_inserted"),
];

/// `viral_content`: hand-curated entries.
pub const VIRAL_CONTENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::plain("platform", "platform"),
    FieldSpec::plain("url", "url"),
    FieldSpec::defaulted("views", "views", FieldDefault::Zero),
    FieldSpec::plain("followersAtTime", "followers_at_time"),
    FieldSpec::defaulted("datePosted", "date_posted", FieldDefault::Today),
    FieldSpec::plain("niche", "niche"),
    FieldSpec::defaulted("formatType", "format_type", FieldDefault::Text(DEFAULT_FORMAT)),
    FieldSpec::plain("hookText", "hook_text"),
    FieldSpec::plain("visualHookDesc", "visual_hook_desc"),
    FieldSpec::plain("verbalHookText", "verbal_hook_text"),
    FieldSpec::plain("writtenHookText", "written_hook_text"),
];

/// `hook_patterns`. No defaults; the table's own column defaults apply.
pub const HOOK_PATTERN_FIELDS: &[FieldSpec] = &[
    FieldSpec::plain("template", "template"),
    FieldSpec::plain("category", "category"),
    FieldSpec::plain("occurrenceFrequency", "occurrence_frequency"),
    FieldSpec::plain("avgViralRatio", "avg_viral_ratio"),
    FieldSpec::plain("sampleSize", "sample_size"),
    FieldSpec::plain("confidenceLevel", "confidence_level"),
];

/// Fields a hook update may touch: external name -> column.
pub const HOOK_UPDATE_FIELDS: &[(&str, &str)] = &[
    ("hook", "hook"),
    ("visualHookType", "visual_hook_type"),
    ("audioHookType", "audio_hook_type"),
    ("writtenHookType", "written_hook_type"),
    ("industry", "industry"),
    ("postType", "post_type"),
];

/// Scraper fields the CSV loader tries to read as integers.
pub const CSV_INTEGER_FIELDS: &[&str] = &[
    "likesCount",
    "videoPlayCount",
    "videoViewCount",
    "commentsCount",
    "videoDuration",
];
