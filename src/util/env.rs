//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Environment keys consulted for the Supabase project URL, in order.
pub const SUPABASE_URL_KEYS: &[&str] = &["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];

/// Environment keys consulted for the API key, in order. The service role key
/// is preferred because row level security may block anon inserts.
pub const SUPABASE_KEY_KEYS: &[&str] = &[
    "SUPABASE_SERVICE_ROLE_KEY",
    "SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
];

/// Load .env files exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        crate::env_boot::ensure_dotenv();
    });
}

/// Get required env var; error if missing.
pub fn env_req(key: &str) -> anyhow::Result<String> {
    env_opt(key).ok_or_else(|| anyhow::anyhow!("missing env var {key}"))
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// First non-empty value among `keys`, along with the key that supplied it.
pub fn env_first(keys: &[&str]) -> Option<(String, String)> {
    keys.iter()
        .find_map(|k| env_opt(k).map(|v| ((*k).to_string(), v)))
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match env_opt(key) {
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(target = "env", key, "unparseable value; using default");
            default
        }),
        None => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(raw) => {
            let v = raw.to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        None => default,
    }
}

/// Supabase project URL, e.g. `https://<ref>.supabase.co`.
pub fn supabase_url() -> anyhow::Result<String> {
    let (key, url) = env_first(SUPABASE_URL_KEYS).ok_or_else(|| {
        anyhow::anyhow!(
            "no Supabase URL configured; set one of {:?}",
            SUPABASE_URL_KEYS
        )
    })?;
    info!(target = "env", source = %key, "Supabase URL resolved");
    Ok(url)
}

/// Supabase API key (service role or anon).
pub fn supabase_key() -> anyhow::Result<String> {
    let (key, value) = env_first(SUPABASE_KEY_KEYS).ok_or_else(|| {
        anyhow::anyhow!(
            "no Supabase API key configured; set one of {:?}",
            SUPABASE_KEY_KEYS
        )
    })?;
    if key != "SUPABASE_SERVICE_ROLE_KEY" {
        warn!(
            target = "env",
            source = %key,
            "using anon key; inserts may be rejected by row level security"
        );
    }
    Ok(value)
}

fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if val.is_empty() {
        return String::new();
    }
    if k.contains("PASSWORD")
        || k.contains("SECRET")
        || k.contains("KEY")
        || k.contains("TOKEN")
    {
        return "***".to_string();
    }

    // URLs are logged without any userinfo component.
    if let Ok(mut u) = url::Url::parse(val) {
        if !u.username().is_empty() || u.password().is_some() {
            let _ = u.set_username("***");
            let _ = u.set_password(None);
        }
        return u.to_string();
    }

    val.to_string()
}

/// Validate required keys and log a consolidated, redacted snapshot of configuration.
///
/// Each entry of `required` is a group of alternatives; the check passes when
/// at least one key of every group is set.
pub fn preflight_check(
    title: &str,
    required: &[&[&str]],
    also_log: &[&str],
) -> anyhow::Result<()> {
    init_env();
    let missing: Vec<&[&str]> = required
        .iter()
        .copied()
        .filter(|group| env_first(group).is_none())
        .collect();
    let snapshot: Vec<(String, String)> = also_log
        .iter()
        .map(|k| {
            let v = env_opt(k).unwrap_or_default();
            (k.to_string(), redact_value(k, &v))
        })
        .collect();
    info!(target = "preflight", title, snapshot = ?snapshot, "configuration snapshot");
    if !missing.is_empty() {
        return Err(anyhow::anyhow!(
            "missing required env (one of each group): {:?}",
            missing
        ));
    }
    Ok(())
}
