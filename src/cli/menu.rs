//! Interactive data-entry loop.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use tracing::warn;

use super::commands;
use super::prompt::Prompter;
use crate::database_ops::{Ingestor, RemoteStore, Tables};
use crate::loader::{self, FileFormat};
use crate::normalization::content::{normalize_niche, non_empty, DEFAULT_NICHE, SUGGESTED_NICHES};
use crate::normalization::{
    ContentEntry, HookCategory, HookPattern, Normalizer, Platform, Profile, RawRecord,
};

const MENU: &str = "
1. Add Viral Content
2. Add Hook Pattern
3. Bulk Import (JSON)
4. Bulk Import (CSV)
5. Update Video Hooks
6. Database Stats
7. Generate SQL
8. Exit";

pub struct Session<'a, S: RemoteStore + ?Sized, R, W> {
    store: &'a S,
    tables: &'a Tables,
    prompt: Prompter<R, W>,
    today: NaiveDate,
}

impl<'a, S, R, W> Session<'a, S, R, W>
where
    S: RemoteStore + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(store: &'a S, tables: &'a Tables, prompt: Prompter<R, W>, today: NaiveDate) -> Self {
        Self {
            store,
            tables,
            prompt,
            today,
        }
    }

    pub fn into_prompter(self) -> Prompter<R, W> {
        self.prompt
    }

    /// Runs until the user exits, declines to add more, or input ends.
    pub async fn run(&mut self) -> Result<()> {
        self.prompt.say("\nViralizes - Supabase data entry")?;
        self.prompt.say("=".repeat(40))?;
        loop {
            self.prompt.say(MENU)?;
            let Some(choice) = self.prompt.ask_line("\nChoice (1-8): ")? else {
                break;
            };
            let result = match choice.as_str() {
                "1" => self.add_viral_content().await,
                "2" => self.add_hook_pattern().await,
                "3" => self.bulk_import(FileFormat::Json).await,
                "4" => self.bulk_import(FileFormat::Csv).await,
                "5" => self.update_video_hooks().await,
                "6" => self.stats().await,
                "7" => self.generate_sql(),
                "8" => break,
                _ => {
                    self.prompt.say("Invalid choice")?;
                    continue;
                }
            };
            if let Err(e) = result {
                warn!(choice = %choice, error = %format!("{e:#}"), "menu action failed");
                self.prompt.say(format!("Error: {e:#}"))?;
            }
            if matches!(choice.as_str(), "1" | "2" | "3" | "4" | "5")
                && !self.prompt.confirm("\nAdd more data? (y/n): ")?
            {
                break;
            }
        }
        self.prompt.say("\nDone!")?;
        Ok(())
    }

    async fn add_viral_content(&mut self) -> Result<()> {
        self.prompt.say("\nAdding viral content\n")?;
        let url = self.prompt.ask("URL: ")?;
        if url.is_empty() {
            bail!("a URL is required");
        }
        let views: u64 = self.prompt.ask_parsed("Views: ", None)?;
        let followers: u64 = self.prompt.ask_parsed("Creator's Followers: ", None)?;
        let hook = self.prompt.ask("Hook Text (first 5 seconds): ")?;

        let label = self.prompt.ask("Platform (tiktok/instagram) [tiktok]: ")?;
        let platform = if label.is_empty() {
            Platform::from_url(&url).unwrap_or_default()
        } else {
            match Platform::from_label(&label) {
                Some(p) => p,
                None => {
                    self.prompt
                        .say(format!("Unknown platform {label:?}, using tiktok"))?;
                    Platform::default()
                }
            }
        };

        self.prompt
            .say(format!("\nNiches: {}", SUGGESTED_NICHES.join(", ")))?;
        let niche = normalize_niche(&self.prompt.ask_or("Niche [Fitness]: ", DEFAULT_NICHE)?);
        let date_label = format!("Date posted (YYYY-MM-DD) [{}]: ", self.today);
        let date_posted: NaiveDate = self.prompt.ask_parsed(&date_label, Some(self.today))?;

        let mut entry = ContentEntry::new(platform, url, self.today);
        entry.views = views;
        entry.followers_at_time = Some(followers);
        entry.date_posted = date_posted;
        entry.niche = niche;
        entry.hook_text = non_empty(hook);

        if let Some(ratio) = entry.viral_ratio() {
            self.prompt.say(format!("\nViral Ratio: {ratio:.1}x"))?;
        }
        if self.prompt.confirm("\nAdd visual description? (y/n): ")? {
            entry.visual_hook_desc = non_empty(self.prompt.ask("Visual description: ")?);
        }

        let ingestor = Ingestor::new(
            self.store,
            &self.tables.viral_content,
            Normalizer::new(Profile::ViralContent),
        )
        .with_today(self.today);
        ingestor.insert_one(&entry.to_raw()?).await?;
        self.prompt.say("Viral content added successfully!")?;
        Ok(())
    }

    async fn add_hook_pattern(&mut self) -> Result<()> {
        self.prompt.say("\nAdding hook pattern\n")?;
        let template = self.prompt.ask("Template (use {variables}): ")?;
        if template.is_empty() {
            bail!("a template is required");
        }

        let names: Vec<&str> = HookCategory::ALL.iter().map(|c| c.as_str()).collect();
        self.prompt
            .say(format!("\nCategories: {}", names.join(", ")))?;
        let typed = self.prompt.ask("Category [Relatable]: ")?;
        let category = if typed.is_empty() {
            HookCategory::default()
        } else {
            typed.parse().unwrap_or_else(|_| {
                warn!(category = %typed, "unknown hook category, using default");
                HookCategory::default()
            })
        };

        let sample_size: u32 = self.prompt.ask_parsed("Sample size [1]: ", Some(1))?;
        let mut pattern = HookPattern::new(template, category).with_sample_size(sample_size);
        pattern.avg_viral_ratio = self.prompt.ask_parsed("Average viral ratio [0]: ", Some(0.0))?;
        pattern.confidence_level = self.prompt.ask_parsed("Confidence level % [0]: ", Some(0.0))?;

        let found = pattern.placeholders();
        if !found.is_empty() {
            self.prompt
                .say(format!("Placeholders: {}", found.join(", ")))?;
        }
        commands::add_hook(self.store, self.tables, &pattern, self.prompt.out()).await?;
        Ok(())
    }

    async fn bulk_import(&mut self, format: FileFormat) -> Result<()> {
        let kind = match format {
            FileFormat::Json => "JSON",
            FileFormat::Csv => "CSV",
        };
        self.prompt.say(format!("\nBulk import from {kind}\n"))?;
        let source = self
            .prompt
            .ask(&format!("1. Load from file\n2. Paste {kind}\nChoice: "))?;
        let records = if source == "1" {
            let path = self.prompt.ask(&format!("{kind} file path: "))?;
            loader::load_file(&path, Some(format))?
        } else {
            self.prompt
                .say(format!("\nPaste {kind} (press Enter twice when done):"))?;
            let text = self.prompt.read_block()?;
            match format {
                FileFormat::Json => loader::parse_json_str(&text)?,
                FileFormat::Csv => loader::parse_csv_str(&text)?,
            }
        };

        let choices = self.tables.writable().join("/");
        let label = format!("\nTable ({choices}) [{}]: ", self.tables.viral_content);
        let table = self.prompt.ask_or(&label, &self.tables.viral_content)?;
        let profile = commands::resolve_table(self.tables, &table)?;

        commands::preview(profile, &records, self.today, self.prompt.out())?;
        if records.is_empty() || !self.prompt.confirm("\nProceed with import? (y/n): ")? {
            self.prompt.say("Import skipped.")?;
            return Ok(());
        }
        commands::import_records(
            self.store,
            self.tables,
            profile,
            &records,
            self.today,
            self.prompt.out(),
        )
        .await?;
        Ok(())
    }

    async fn update_video_hooks(&mut self) -> Result<()> {
        self.prompt.say("\nUpdating video hooks\n")?;
        let url = self.prompt.ask("Video URL: ")?;
        if url.is_empty() {
            bail!("a URL is required");
        }
        self.prompt.say(
            "Fields: hook, visualHookType, audioHookType, writtenHookType, industry, postType",
        )?;
        let mut pairs = Vec::new();
        loop {
            let line = self.prompt.ask("field=value (blank to finish): ")?;
            if line.is_empty() {
                break;
            }
            pairs.push(line);
        }
        let updates: RawRecord = commands::parse_assignments(&pairs)?;
        commands::update_hooks(self.store, self.tables, &url, &updates, self.prompt.out()).await?;
        Ok(())
    }

    async fn stats(&mut self) -> Result<()> {
        commands::print_stats(self.store, self.tables, None, self.prompt.out()).await?;
        Ok(())
    }

    fn generate_sql(&mut self) -> Result<()> {
        self.prompt.say("\nSQL generator\n")?;
        let mode = self
            .prompt
            .ask("1. Example SQL template\n2. INSERTs from pasted CSV\nChoice: ")?;
        if mode == "2" {
            self.prompt
                .say("\nPaste your CSV data (press Enter twice when done):")?;
            let text = self.prompt.read_block()?;
            let records = loader::parse_csv_str(&text)?;
            let table = self.prompt.ask("Table name: ")?;
            if table.is_empty() {
                bail!("a table name is required");
            }
            commands::print_generated_sql(&table, &records, self.prompt.out())
        } else {
            let choices = self.tables.writable().join("/");
            let table = self.prompt.ask(&format!("Table ({choices}): "))?;
            let profile = commands::resolve_table(self.tables, &table)?;
            commands::print_sql_template(profile, self.prompt.out())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::testing::{Call, MemoryStore};
    use serde_json::{json, Value};
    use std::io::Cursor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()
    }

    async fn drive(store: &MemoryStore, script: &str) -> String {
        let tables = Tables::default();
        let prompt = Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
        let mut session = Session::new(store, &tables, prompt, today());
        session.run().await.unwrap();
        let (_, out) = session.into_prompter().into_parts();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn adds_viral_content_with_defaults() {
        let store = MemoryStore::new();
        let script = "1\nhttps://www.instagram.com/reel/abc\n2500000\n100000\nPOV: you finally hit your PR\n\nbeauty/skincare\n\ny\nQuick cuts\nn\n";
        let out = drive(&store, script).await;

        assert!(out.contains("Viral Ratio: 25.0x"));
        assert!(out.contains("Viral content added successfully!"));
        let rows = store.rows("viral_content");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("platform"), Some(&json!("instagram")));
        assert_eq!(row.get("niche"), Some(&json!("Beauty/Skincare")));
        assert_eq!(row.get("date_posted"), Some(&json!("2024-03-20")));
        assert_eq!(row.get("format_type"), Some(&json!("video")));
        assert_eq!(row.get("visual_hook_desc"), Some(&json!("Quick cuts")));
        assert!(row.get("verbal_hook_text").is_none());
    }

    #[tokio::test]
    async fn unknown_category_falls_back_and_placeholders_are_echoed() {
        let store = MemoryStore::new();
        let script = "2\nPOV: You're {situation} and {outcome}\nMystery\n100\n18.5\n95\nn\n";
        let out = drive(&store, script).await;

        assert!(out.contains("Placeholders: situation, outcome"));
        let rows = store.rows("hook_patterns");
        assert_eq!(rows[0].get("category"), Some(&json!("Relatable")));
        assert_eq!(rows[0].get("sample_size"), Some(&json!(100)));
        assert_eq!(rows[0].get("occurrence_frequency"), Some(&json!(100)));
        assert_eq!(rows[0].get("avg_viral_ratio"), Some(&json!(18.5)));
    }

    #[tokio::test]
    async fn pasted_csv_import_goes_through_one_batch() {
        let store = MemoryStore::new();
        let script = "4\n2\nurl,likesCount\nhttps://x/1,10\nhttps://x/2,lots\n\n\nviral_videos\ny\nn\n";
        let out = drive(&store, script).await;

        assert!(out.contains("Found 2 records to import"));
        assert!(out.contains("Successfully imported 2 of 2 records into viral_videos."));
        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        let Call::Insert { rows, .. } = &calls[0] else {
            panic!("expected one insert");
        };
        assert_eq!(rows[0].get("likes_count"), Some(&json!(10)));
        assert_eq!(rows[1].get("likes_count"), Some(&json!("lots")));
    }

    #[tokio::test]
    async fn declined_import_sends_nothing() {
        let store = MemoryStore::new();
        let script = "3\n2\n{\"url\": \"https://x/1\"}\n\n\n\nn\nn\n";
        let out = drive(&store, script).await;
        assert!(out.contains("Import skipped."));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn errors_are_reported_and_the_loop_continues() {
        let store = MemoryStore::new();
        let script = "3\n1\n/definitely/not/here.json\ny\n8\n";
        let out = drive(&store, script).await;
        assert!(out.contains("Error: file not found: /definitely/not/here.json"));
        assert!(out.ends_with("Done!\n"));
    }

    #[tokio::test]
    async fn updates_hooks_by_url() {
        let store = MemoryStore::new().seed(
            "viral_videos",
            vec![json!({"id": 1, "url": "u1"}).as_object().cloned().unwrap()],
        );
        let script = "5\nu1\nvisualHookType=Split\ngarbage=x\n\nn\n";
        let out = drive(&store, script).await;
        assert!(out.contains("Updated video: u1"));
        let calls = store.calls();
        let Call::Update { patch, .. } = &calls[0] else {
            panic!("expected update");
        };
        assert_eq!(Value::Object(patch.clone()), json!({"visual_hook_type": "Split"}));
    }

    #[tokio::test]
    async fn sql_and_stats_do_not_ask_for_more() {
        let store = MemoryStore::new();
        let script = "7\n1\nhook_patterns\n6\n9\n8\n";
        let out = drive(&store, script).await;
        assert!(out.contains("INSERT INTO hook_patterns"));
        assert!(out.contains("Total videos: 0"));
        assert!(out.contains("Invalid choice"));
        assert!(!out.contains("Add more data?"));
    }

    #[tokio::test]
    async fn generates_inserts_from_pasted_csv() {
        let store = MemoryStore::new();
        let script = "7\n2\nurl,views\nhttps://x/1,2500\n\n\nviral_content\n8\n";
        let out = drive(&store, script).await;
        assert!(out.contains("INSERT INTO viral_content (url, views) VALUES ('https://x/1', 2500);"));
    }

    #[tokio::test]
    async fn end_of_input_exits_cleanly() {
        let store = MemoryStore::new();
        let out = drive(&store, "").await;
        assert!(out.ends_with("Done!\n"));
    }
}
