use dotenv::{dotenv, from_filename};

/// Load `.env.local` and `.env` from the current working directory; if neither
/// exists, try the project root. Variables already present in the process
/// environment are never overwritten, so `.env.local` wins over `.env`.
pub fn ensure_dotenv() {
    let local = from_filename(".env.local").is_ok();
    let plain = dotenv().is_ok();
    if local || plain {
        return;
    }
    // Fallback to Cargo project root
    let root = env!("CARGO_MANIFEST_DIR");
    let _ = from_filename(format!("{root}/.env.local"));
    let _ = from_filename(format!("{root}/.env"));
}
