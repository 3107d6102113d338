use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::store::{RemoteStore, Row};
use crate::normalization::{Normalizer, RawRecord};

/// A record the fallback path could not insert.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecord {
    /// Position in the input batch.
    pub index: usize,
    pub url: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Stored rows, in input order.
    pub stored: Vec<Row>,
    /// Only populated when the batch call failed and records were retried one by one.
    pub failed: Vec<FailedRecord>,
    /// Whether the single batch call failed and the per-record path ran.
    pub fell_back: bool,
}

impl BatchOutcome {
    pub fn summary(&self) -> String {
        if self.fell_back {
            format!(
                "{} inserted individually, {} failed",
                self.stored.len(),
                self.failed.len()
            )
        } else {
            format!("{} inserted", self.stored.len())
        }
    }
}

/// Normalizes raw records and writes them to one table.
///
/// Calls run strictly one after another: the fallback path retries each
/// record in input order with no backoff.
pub struct Ingestor<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    table: String,
    normalizer: Normalizer,
    today: NaiveDate,
}

impl<'a, S: RemoteStore + ?Sized> Ingestor<'a, S> {
    pub fn new(store: &'a S, table: impl Into<String>, normalizer: Normalizer) -> Self {
        Self {
            store,
            table: table.into(),
            normalizer,
            today: Utc::now().date_naive(),
        }
    }

    /// Fix the date used for date defaults.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn to_row(&self, raw: &RawRecord) -> Row {
        let normalized = self.normalizer.normalize_with_diagnostics(raw, self.today);
        if !normalized.dropped.is_empty() {
            warn!(
                table = %self.table,
                dropped = ?normalized.dropped,
                "ignoring fields with no destination column"
            );
        }
        normalized.record.into_row()
    }

    /// Normalize and insert one record; returns the stored row.
    #[instrument(skip_all, fields(table = %self.table))]
    pub async fn insert_one(&self, raw: &RawRecord) -> Result<Row> {
        let row = self.to_row(raw);
        let url = url_label(&row);
        match self.store.insert(&self.table, std::slice::from_ref(&row)).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(stored) => {
                    info!(url = %url, "inserted record");
                    Ok(stored)
                }
                None => {
                    error!(url = %url, "insert returned no rows");
                    Err(anyhow!("insert into {} returned no rows for {url}", self.table))
                }
            },
            Err(e) => {
                error!(url = %url, error = %e, "insert failed");
                Err(e).with_context(|| format!("insert into {} failed for {url}", self.table))
            }
        }
    }

    /// One batch call; on failure, every record is retried alone and only
    /// the successes are kept.
    #[instrument(skip_all, fields(table = %self.table, records = raws.len()))]
    pub async fn insert_batch(&self, raws: &[RawRecord]) -> BatchOutcome {
        if raws.is_empty() {
            return BatchOutcome::default();
        }
        let rows: Vec<Row> = raws.iter().map(|r| self.to_row(r)).collect();
        match self.store.insert(&self.table, &rows).await {
            Ok(stored) => {
                info!(rows = stored.len(), "batch insert succeeded");
                BatchOutcome {
                    stored,
                    ..BatchOutcome::default()
                }
            }
            Err(e) => {
                warn!(error = %e, "batch insert failed; inserting records individually");
                let mut outcome = BatchOutcome {
                    fell_back: true,
                    ..BatchOutcome::default()
                };
                for (index, raw) in raws.iter().enumerate() {
                    match self.insert_one(raw).await {
                        Ok(row) => outcome.stored.push(row),
                        Err(err) => outcome.failed.push(FailedRecord {
                            index,
                            url: rows[index]
                                .get("url")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                            error: format!("{err:#}"),
                        }),
                    }
                }
                info!(
                    stored = outcome.stored.len(),
                    failed = outcome.failed.len(),
                    "individual inserts finished"
                );
                outcome
            }
        }
    }
}

fn url_label(row: &Row) -> String {
    row.get("url")
        .and_then(Value::as_str)
        .unwrap_or("<no url>")
        .to_string()
}
