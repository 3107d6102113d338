//! Operations shared by the interactive menu and the one-shot subcommands.
//! Each writes human-readable lines to `out` and returns the typed result.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::io::Write;
use tracing::info;

use super::sql;
use crate::database_ops::{
    BatchOutcome, Ingestor, RemoteStore, Reporter, Row, StatsReport, Tables, UpdateOutcome,
    Updater,
};
use crate::normalization::{HookPattern, Normalizer, Profile, RawRecord};

/// Resolve a table name typed by the user to its profile.
pub fn resolve_table(tables: &Tables, table: &str) -> Result<Profile> {
    tables.profile_for(table).ok_or_else(|| {
        anyhow!(
            "unknown table {:?}; expected one of {}",
            table.trim(),
            tables.writable().join(", ")
        )
    })
}

/// `key=value` pairs into an update map. Values are kept as text.
pub fn parse_assignments<I, T>(pairs: I) -> Result<RawRecord>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut out = RawRecord::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {pair:?}"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("empty field name in {pair:?}");
        }
        out.insert(key.to_string(), Value::from(value.trim()));
    }
    Ok(out)
}

pub async fn add_hook<S, W>(
    store: &S,
    tables: &Tables,
    pattern: &HookPattern,
    out: &mut W,
) -> Result<Row>
where
    S: RemoteStore + ?Sized,
    W: Write,
{
    let raw = pattern.to_raw()?;
    let ingestor = Ingestor::new(store, &tables.hook_patterns, Normalizer::new(Profile::HookPattern));
    let row = ingestor.insert_one(&raw).await?;
    writeln!(out, "Hook pattern added successfully!")?;
    Ok(row)
}

pub async fn import_records<S, W>(
    store: &S,
    tables: &Tables,
    profile: Profile,
    records: &[RawRecord],
    today: NaiveDate,
    out: &mut W,
) -> Result<BatchOutcome>
where
    S: RemoteStore + ?Sized,
    W: Write,
{
    if records.is_empty() {
        writeln!(out, "Nothing to import.")?;
        return Ok(BatchOutcome::default());
    }
    let table = tables.table_for(profile);
    let outcome = Ingestor::new(store, table, Normalizer::new(profile))
        .with_today(today)
        .insert_batch(records)
        .await;
    info!(table, summary = %outcome.summary(), "import finished");

    if outcome.failed.is_empty() && !outcome.stored.is_empty() {
        writeln!(
            out,
            "Successfully imported {} of {} records into {table}.",
            outcome.stored.len(),
            records.len()
        )?;
    } else {
        writeln!(out, "Imported into {table}: {}", outcome.summary())?;
    }
    for failed in &outcome.failed {
        writeln!(
            out,
            "  #{} {}: {}",
            failed.index + 1,
            failed.url.as_deref().unwrap_or("<no url>"),
            failed.error
        )?;
    }
    Ok(outcome)
}

/// JSON preview of the first record as it will be sent.
pub fn preview<W: Write>(
    profile: Profile,
    records: &[RawRecord],
    today: NaiveDate,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "\nFound {} records to import", records.len())?;
    if let Some(first) = records.first() {
        let normalized = Normalizer::new(profile).normalize_with_diagnostics(first, today);
        let pretty = serde_json::to_string_pretty(&normalized.record)?;
        writeln!(out, "Preview: {pretty}")?;
        if !normalized.dropped.is_empty() {
            writeln!(out, "Ignored fields: {}", normalized.dropped.join(", "))?;
        }
    }
    Ok(())
}

pub async fn update_hooks<S, W>(
    store: &S,
    tables: &Tables,
    url: &str,
    updates: &RawRecord,
    out: &mut W,
) -> Result<UpdateOutcome>
where
    S: RemoteStore + ?Sized,
    W: Write,
{
    let outcome = Updater::new(store, &tables.viral_videos)
        .update_by_url(url, updates)
        .await?;
    match &outcome {
        UpdateOutcome::Updated(_) => writeln!(out, "Updated video: {url}")?,
        UpdateOutcome::NotFound => writeln!(out, "No video found with url {url}")?,
    }
    Ok(outcome)
}

pub async fn print_stats<S, W>(
    store: &S,
    tables: &Tables,
    videos_table: Option<&str>,
    out: &mut W,
) -> Result<StatsReport>
where
    S: RemoteStore + ?Sized,
    W: Write,
{
    let videos = videos_table.unwrap_or(&tables.viral_videos);
    let report = Reporter::new(store, videos, &tables.industries)
        .get_stats()
        .await
        .context("error getting stats")?;
    write!(out, "\n{report}")?;
    Ok(report)
}

pub fn print_sql_template<W: Write>(profile: Profile, out: &mut W) -> Result<()> {
    writeln!(out, "\n-- Example SQL for {}:", profile.default_table())?;
    writeln!(out, "{}", sql::insert_template(profile))?;
    writeln!(out, "\nCopy this SQL into the Supabase SQL Editor")?;
    Ok(())
}

pub fn print_generated_sql<W: Write>(table: &str, records: &[RawRecord], out: &mut W) -> Result<()> {
    writeln!(out, "\n-- Generated SQL:")?;
    for stmt in sql::insert_statements(table, records) {
        writeln!(out, "{stmt}")?;
    }
    writeln!(out, "\nCopy this SQL into the Supabase SQL Editor")?;
    Ok(())
}

pub fn print_csv_templates<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "CSV templates:")?;
    for profile in Profile::ALL {
        writeln!(out, "\n=== {} ===", profile.default_table())?;
        writeln!(out, "{}", sql::csv_template(profile))?;
    }
    writeln!(
        out,
        "\nCopy a template to a spreadsheet, fill it in, then export as CSV"
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::testing::MemoryStore;
    use crate::normalization::HookCategory;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let map = parse_assignments(["hook=a=b", " industry = Tech "]).unwrap();
        assert_eq!(Value::Object(map), json!({"hook": "a=b", "industry": "Tech"}));
        assert!(parse_assignments(["nope"]).is_err());
        assert!(parse_assignments(["=x"]).is_err());
    }

    #[test]
    fn unknown_table_lists_choices() {
        let err = resolve_table(&Tables::default(), "videos").unwrap_err();
        assert!(err.to_string().contains("viral_content, viral_videos, hook_patterns"));
    }

    #[tokio::test]
    async fn add_hook_writes_pattern_row() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        let pattern = HookPattern::new("Wait for it... {reveal}", HookCategory::Suspense)
            .with_sample_size(150);
        let row = add_hook(&store, &Tables::default(), &pattern, &mut out)
            .await
            .unwrap();
        assert_eq!(row.get("occurrence_frequency"), Some(&json!(150)));
        assert_eq!(store.rows("hook_patterns").len(), 1);
        assert!(text(out).contains("Hook pattern added"));
    }

    #[tokio::test]
    async fn import_reports_partial_failures() {
        let store = MemoryStore::new().rejecting(&["https://x/2"]);
        let records: Vec<RawRecord> = ["https://x/1", "https://x/2"]
            .iter()
            .map(|u| json!({"url": u, "likesCount": 1}).as_object().cloned().unwrap())
            .collect();
        let mut out = Vec::new();
        let outcome = import_records(
            &store,
            &Tables::default(),
            Profile::ScrapedVideo,
            &records,
            today(),
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(outcome.stored.len(), 1);
        let out = text(out);
        assert!(out.contains("1 inserted individually, 1 failed"));
        assert!(out.contains("#2 https://x/2"));
    }

    #[tokio::test]
    async fn import_of_nothing_makes_no_call() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        import_records(&store, &Tables::default(), Profile::ViralContent, &[], today(), &mut out)
            .await
            .unwrap();
        assert!(store.calls().is_empty());
    }

    #[test]
    fn preview_shows_normalized_first_record() {
        let records = vec![json!({"url": "https://x/1", "views": 10, "extra": 1})
            .as_object()
            .cloned()
            .unwrap()];
        let mut out = Vec::new();
        preview(Profile::ViralContent, &records, today(), &mut out).unwrap();
        let out = text(out);
        assert!(out.contains("Found 1 records"));
        assert!(out.contains("\"date_posted\": \"2024-03-20\""));
        assert!(out.contains("Ignored fields: extra"));
    }

    #[tokio::test]
    async fn update_reports_missing_video() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        let updates = parse_assignments(["industry=Tech"]).unwrap();
        let outcome = update_hooks(&store, &Tables::default(), "https://x/none", &updates, &mut out)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert!(text(out).contains("No video found"));
    }

    #[tokio::test]
    async fn stats_are_printed() {
        let store = MemoryStore::new().seed(
            "viral_videos",
            vec![json!({"id": 1, "platform": "tiktok"}).as_object().cloned().unwrap()],
        );
        let mut out = Vec::new();
        let report = print_stats(&store, &Tables::default(), None, &mut out)
            .await
            .unwrap();
        assert_eq!(report.total, 1);
        assert!(text(out).contains("Total videos: 1"));
    }

    #[test]
    fn templates_cover_every_table() {
        let mut out = Vec::new();
        print_csv_templates(&mut out).unwrap();
        let out = text(out);
        for profile in Profile::ALL {
            assert!(out.contains(&format!("=== {} ===", profile.default_table())));
        }
    }
}
