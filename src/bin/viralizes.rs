use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use viral_ingest::cli::commands;
use viral_ingest::cli::menu::Session;
use viral_ingest::cli::prompt::Prompter;
use viral_ingest::database_ops::{PostgrestConfig, PostgrestStore, Tables, UpdateOutcome};
use viral_ingest::loader::{self, FileFormat};
use viral_ingest::logging::{init_tracing, DEFAULT_FILTER};
use viral_ingest::normalization::{HookCategory, HookPattern};
use viral_ingest::util::env;

#[derive(Parser, Debug)]
#[command(
    name = "viralizes",
    version,
    about = "Load viral video data into Supabase"
)]
struct Cli {
    /// Supabase project URL (overrides SUPABASE_URL / NEXT_PUBLIC_SUPABASE_URL)
    #[arg(long, global = true)]
    supabase_url: Option<String>,
    /// API key (overrides SUPABASE_SERVICE_ROLE_KEY / SUPABASE_ANON_KEY)
    #[arg(long, global = true)]
    supabase_key: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Interactive data entry (default)
    Menu,
    /// Insert one hook pattern
    AddHook {
        /// Template text; `{name}` marks a placeholder
        #[arg(long)]
        template: String,
        #[arg(long, default_value = "Relatable")]
        category: HookCategory,
        /// Also used as the occurrence frequency
        #[arg(long, default_value_t = 1)]
        sample_size: u32,
        #[arg(long, default_value_t = 0.0)]
        avg_viral_ratio: f64,
        #[arg(long, default_value_t = 0.0)]
        confidence_level: f64,
    },
    /// Bulk import a JSON or CSV/TSV file
    Import {
        #[arg(long)]
        file: PathBuf,
        /// Destination table (default: viral_videos)
        #[arg(long)]
        table: Option<String>,
        /// Input format (default: from the file extension)
        #[arg(long, value_enum)]
        format: Option<FileFormat>,
        /// Skip the confirmation prompt (or set IMPORT_ASSUME_YES=1)
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Update hook metadata of a video by url
    Update {
        #[arg(long)]
        url: String,
        /// Field assignment, e.g. --set visualHookType="Split Screen"
        #[arg(long = "set", value_name = "KEY=VALUE", required = true, num_args = 1..)]
        set: Vec<String>,
    },
    /// Print row counts by platform and the top industries
    Stats {
        /// Videos table to count (default: viral_videos)
        #[arg(long)]
        table: Option<String>,
    },
    /// Print an example INSERT statement for a table
    Sql {
        #[arg(long)]
        table: String,
    },
    /// Print CSV header templates for every table
    Templates,
}

/// Build the store client after checking configuration. CLI overrides skip
/// the corresponding env requirement.
fn connect(url: Option<String>, key: Option<String>) -> Result<PostgrestStore> {
    let mut required: Vec<&[&str]> = Vec::new();
    if url.is_none() {
        required.push(env::SUPABASE_URL_KEYS);
    }
    if key.is_none() {
        required.push(env::SUPABASE_KEY_KEYS);
    }
    env::preflight_check(
        "viralizes",
        &required,
        &[
            "SUPABASE_URL",
            "NEXT_PUBLIC_SUPABASE_URL",
            "SUPABASE_SERVICE_ROLE_KEY",
            "SUPABASE_ANON_KEY",
            "SUPABASE_TIMEOUT_SECS",
            "VIRAL_CONTENT_TABLE",
            "VIRAL_VIDEOS_TABLE",
            "HOOK_PATTERNS_TABLE",
            "INDUSTRIES_TABLE",
        ],
    )?;
    let cfg = PostgrestConfig::from_env(url, key)?;
    let store = PostgrestStore::new(&cfg).context("building Supabase client")?;
    info!(rest = %store.rest_base(), timeout_secs = cfg.timeout_secs, "Supabase client ready");
    Ok(store)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;

    let cli = Cli::parse();
    let tables = Tables::from_env();
    let mut out = io::stdout();

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Sql { table } => {
            let profile = commands::resolve_table(&tables, &table)?;
            commands::print_sql_template(profile, &mut out)?;
        }
        Commands::Templates => commands::print_csv_templates(&mut out)?,
        Commands::Menu => {
            let store = connect(cli.supabase_url, cli.supabase_key)?;
            let stdin = io::stdin();
            let prompt = Prompter::new(stdin.lock(), io::stdout());
            Session::new(&store, &tables, prompt, today()).run().await?;
        }
        Commands::AddHook {
            template,
            category,
            sample_size,
            avg_viral_ratio,
            confidence_level,
        } => {
            if template.trim().is_empty() {
                bail!("--template must not be empty");
            }
            let store = connect(cli.supabase_url, cli.supabase_key)?;
            let mut pattern = HookPattern::new(template.trim(), category).with_sample_size(sample_size);
            pattern.avg_viral_ratio = avg_viral_ratio;
            pattern.confidence_level = confidence_level;
            let found = pattern.placeholders();
            if !found.is_empty() {
                println!("Placeholders: {}", found.join(", "));
            }
            commands::add_hook(&store, &tables, &pattern, &mut out).await?;
        }
        Commands::Import {
            file,
            table,
            format,
            yes,
        } => {
            let table = table.unwrap_or_else(|| tables.viral_videos.clone());
            let profile = commands::resolve_table(&tables, &table)?;
            let records = loader::load_file(&file, format)
                .with_context(|| format!("loading {}", file.display()))?;
            let today = today();
            commands::preview(profile, &records, today, &mut out)?;
            if records.is_empty() {
                return Ok(());
            }
            if !(yes || env::env_flag("IMPORT_ASSUME_YES", false)) {
                let stdin = io::stdin();
                let mut prompt = Prompter::new(stdin.lock(), io::stdout());
                if !prompt.confirm("\nProceed with import? (y/n): ")? {
                    prompt.say("Import skipped.")?;
                    return Ok(());
                }
            }
            let store = connect(cli.supabase_url, cli.supabase_key)?;
            let outcome =
                commands::import_records(&store, &tables, profile, &records, today, &mut out)
                    .await?;
            if outcome.stored.is_empty() {
                bail!("no records were imported into {}", tables.table_for(profile));
            }
        }
        Commands::Update { url, set } => {
            let updates = commands::parse_assignments(&set)?;
            let store = connect(cli.supabase_url, cli.supabase_key)?;
            if let UpdateOutcome::NotFound =
                commands::update_hooks(&store, &tables, &url, &updates, &mut out).await?
            {
                info!(url = %url, "nothing updated");
            }
        }
        Commands::Stats { table } => {
            let store = connect(cli.supabase_url, cli.supabase_key)?;
            commands::print_stats(&store, &tables, table.as_deref(), &mut out).await?;
        }
    }
    Ok(())
}
