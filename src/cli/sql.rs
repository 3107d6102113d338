//! SQL and CSV snippets for pasting into the Supabase SQL editor.

use serde_json::Value;

use crate::normalization::{Profile, RawRecord};

/// Example multi-row INSERT for a table.
pub fn insert_template(profile: Profile) -> &'static str {
    match profile {
        Profile::ViralContent => {
            "INSERT INTO viral_content (platform, url, views, followers_at_time, date_posted, niche, format_type, hook_text)
VALUES
('tiktok', 'URL_HERE', 2500000, 100000, '2024-03-20', 'Fitness', 'video', 'Your hook text here'),
('instagram', 'URL_HERE', 1800000, 75000, '2024-03-19', 'Beauty/Skincare', 'video', 'Another hook');"
        }
        Profile::ScrapedVideo => {
            "INSERT INTO viral_videos (input_url, url, likes_count, video_play_count, video_view_count, video_duration, comments_count, industry, post_type, hook)
VALUES
('https://www.instagram.com/creator', 'URL_HERE', 75000, 1500000, 1200000, 28, 4200, 'Fitness', 'Reel', 'Watch me transform in 30 days');"
        }
        Profile::HookPattern => {
            "INSERT INTO hook_patterns (template, category, occurrence_frequency, avg_viral_ratio, sample_size, confidence_level)
VALUES
('POV: You''re {situation} and {unexpected_outcome}', 'Relatable', 100, 18.5, 100, 95.0),
('Wait for it... {surprise_reveal}', 'Suspense', 150, 22.3, 150, 96.5);"
        }
    }
}

/// Header plus sample rows, for filling in a spreadsheet.
pub fn csv_template(profile: Profile) -> &'static str {
    match profile {
        Profile::ViralContent => {
            "platform,url,views,followers_at_time,date_posted,niche,hook_text,visual_hook_desc
tiktok,https://tiktok.com/@user/video/123,2500000,100000,2024-03-20,Fitness,\"POV: You finally hit your PR\",Quick cuts to reaction
instagram,https://instagram.com/reel/abc,1800000,75000,2024-03-19,Beauty/Skincare,\"Wait for it... glass skin reveal\",Before and after shots"
        }
        Profile::ScrapedVideo => {
            "inputUrl,url,likesCount,videoPlayCount,videoViewCount,videoDuration,timestamp,commentsCount,industry,postType,hook
https://www.instagram.com/fitnessguru,https://www.instagram.com/reel/ABC123XYZ,75000,1500000,1200000,28,2024-01-15T10:30:00Z,4200,Fitness,Reel,Watch me transform in 30 days"
        }
        Profile::HookPattern => {
            "template,category,occurrence_frequency,avg_viral_ratio,sample_size,confidence_level
\"POV: You're {situation} and {unexpected_outcome}\",Relatable,100,18.5,100,95.0
\"Wait for it... {surprise_reveal}\",Suspense,150,22.3,150,96.5"
        }
    }
}

const NUMERIC_HINTS: &[&str] = &[
    "views",
    "followers",
    "_size",
    "frequency",
    "ratio",
    "level",
    "count",
    "duration",
];

fn numeric_column(column: &str) -> bool {
    let lower = column.to_ascii_lowercase();
    NUMERIC_HINTS.iter().any(|hint| lower.contains(hint))
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// SQL literal for a cell. Text that parses as a number is left bare in
/// numeric-looking columns.
pub fn sql_literal(column: &str, value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let trimmed = s.trim();
            if numeric_column(column) && !trimmed.is_empty() && trimmed.parse::<f64>().is_ok() {
                trimmed.to_string()
            } else {
                quote(s)
            }
        }
        other => quote(&other.to_string()),
    }
}

/// One `INSERT` per record, columns in the record's own order.
pub fn insert_statements(table: &str, records: &[RawRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| !r.is_empty())
        .map(|record| {
            let columns: Vec<&str> = record.keys().map(String::as_str).collect();
            let values: Vec<String> = record.iter().map(|(k, v)| sql_literal(k, v)).collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({});",
                columns.join(", "),
                values.join(", ")
            )
        })
        .collect()
}
