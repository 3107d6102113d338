use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE,
};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::store::{EqFilter, RemoteStore, Row, SelectQuery, Selection, StoreError};
use crate::util::env as env_util;

const PREFER: &str = "prefer";
/// Stored rows come back in the response; keys missing from a row take the
/// column default instead of null.
const PREFER_INSERT: &str = "return=representation,missing=default";
const PREFER_UPDATE: &str = "return=representation";
const PREFER_COUNT: &str = "count=exact";

#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://<ref>.supabase.co`.
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl PostgrestConfig {
    /// Resolve from the environment; explicit overrides win.
    pub fn from_env(url: Option<String>, key: Option<String>) -> anyhow::Result<Self> {
        let base_url = match url {
            Some(u) => u,
            None => env_util::supabase_url()?,
        };
        let api_key = match key {
            Some(k) => k,
            None => env_util::supabase_key()?,
        };
        Ok(Self {
            base_url,
            api_key,
            timeout_secs: env_util::env_parse("SUPABASE_TIMEOUT_SECS", 15u64),
        })
    }
}

/// PostgREST client for a Supabase project (`/rest/v1`).
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    rest_base: Url,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl PostgrestStore {
    pub fn new(cfg: &PostgrestConfig) -> Result<Self, StoreError> {
        let rest_base = rest_base(&cfg.base_url)?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&cfg.api_key)
            .map_err(|e| StoreError::Other(format!("invalid api key header: {e}")))?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
            .map_err(|e| StoreError::Other(format!("invalid api key header: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(HeaderName::from_static("apikey"), key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(concat!("viral-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self { rest_base, http })
    }

    pub fn rest_base(&self) -> &Url {
        &self.rest_base
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, StoreError> {
        let url = insert_url(&self.rest_base, table, rows)?;
        debug!(%url, "POST");
        let resp = self
            .http
            .post(url)
            .header(PREFER, PREFER_INSERT)
            .json(rows)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json::<Vec<Row>>().await?)
    }

    #[instrument(skip(self, patch), fields(column = %filter.column))]
    async fn update(
        &self,
        table: &str,
        patch: &Row,
        filter: &EqFilter,
    ) -> Result<Vec<Row>, StoreError> {
        let url = update_url(&self.rest_base, table, filter)?;
        debug!(%url, "PATCH");
        let resp = self
            .http
            .patch(url)
            .header(PREFER, PREFER_UPDATE)
            .json(patch)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json::<Vec<Row>>().await?)
    }

    #[instrument(skip(self, query), fields(columns = %query.columns))]
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Selection, StoreError> {
        let url = select_url(&self.rest_base, table, query)?;
        debug!(%url, "GET");
        let mut req = self.http.get(url);
        if query.count_exact {
            req = req.header(PREFER, PREFER_COUNT);
        }
        let resp = ensure_success(req.send().await?).await?;
        let count = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);
        let data = resp.json::<Vec<Row>>().await?;
        Ok(Selection {
            data,
            count: if query.count_exact { count } else { None },
        })
    }
}

fn rest_base(project_url: &str) -> Result<Url, StoreError> {
    let trimmed = project_url.trim().trim_end_matches('/');
    let base = if trimmed.ends_with("/rest/v1") {
        format!("{trimmed}/")
    } else {
        format!("{trimmed}/rest/v1/")
    };
    Ok(Url::parse(&base)?)
}

fn table_url(base: &Url, table: &str) -> Result<Url, StoreError> {
    let table = table.trim();
    if table.is_empty() || table.contains(['/', '?', '#']) {
        return Err(StoreError::Other(format!("invalid table name {table:?}")));
    }
    Ok(base.join(table)?)
}

/// Union of keys across `rows` in first-seen order. PostgREST needs this as
/// `columns=` when bulk rows do not all carry the same keys.
fn union_columns(rows: &[Row]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !out.contains(&key.as_str()) {
                out.push(key.as_str());
            }
        }
    }
    out
}

fn insert_url(base: &Url, table: &str, rows: &[Row]) -> Result<Url, StoreError> {
    let mut url = table_url(base, table)?;
    let columns = union_columns(rows);
    if !columns.is_empty() {
        url.query_pairs_mut()
            .append_pair("columns", &columns.join(","));
    }
    Ok(url)
}

fn update_url(base: &Url, table: &str, filter: &EqFilter) -> Result<Url, StoreError> {
    let mut url = table_url(base, table)?;
    url.query_pairs_mut()
        .append_pair(&filter.column, &format!("eq.{}", filter.value));
    Ok(url)
}

fn select_url(base: &Url, table: &str, query: &SelectQuery) -> Result<Url, StoreError> {
    let mut url = table_url(base, table)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", &query.columns);
        if let Some((column, order)) = &query.order {
            pairs.append_pair("order", &format!("{column}.{}", order.as_str()));
        }
        if let Some(n) = query.limit {
            pairs.append_pair("limit", &n.to_string());
        }
    }
    Ok(url)
}

/// `0-24/3573` -> 3573, `*/0` -> 0, `0-24/*` -> None.
fn parse_content_range_total(raw: &str) -> Option<u64> {
    raw.rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
}

async fn ensure_success(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Http {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Human-readable message from a PostgREST error body, falling back to the
/// raw body text.
fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<PostgrestErrorBody>(body) else {
        return body.trim().to_string();
    };
    let Some(message) = parsed.message else {
        return body.trim().to_string();
    };
    let mut out = message;
    if let Some(code) = parsed.code {
        out.push_str(&format!(" [{code}]"));
    }
    if let Some(details) = parsed.details.filter(|d| !d.is_empty()) {
        out.push_str(&format!(": {details}"));
    }
    if let Some(hint) = parsed.hint.filter(|h| !h.is_empty()) {
        out.push_str(&format!(" (hint: {hint})"));
    }
    out
}
