//! In-memory `RemoteStore` used by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::store::{EqFilter, Order, RemoteStore, Row, SelectQuery, Selection, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Insert { table: String, rows: Vec<Row> },
    Update { table: String, patch: Row, filter: EqFilter },
    Select { table: String, query: SelectQuery },
}

/// Behaves like PostgREST for the calls the pipeline makes: batches are
/// atomic, ids are assigned on insert, unique `url` is enforced.
#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<i64>,
    rejected_urls: HashSet<String>,
    fail_batches: bool,
    fail_selects: bool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Any insert carrying one of these urls fails (the whole call, as a
    /// check constraint would).
    pub(crate) fn rejecting(mut self, urls: &[&str]) -> Self {
        self.rejected_urls = urls.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Inserts of more than one row fail.
    pub(crate) fn failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    pub(crate) fn failing_selects(mut self) -> Self {
        self.fail_selects = true;
        self
    }

    pub(crate) fn seed(self, table: &str, rows: Vec<Row>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn http(status: u16, message: impl Into<String>) -> StoreError {
    StoreError::Http {
        status,
        message: message.into(),
    }
}

fn url_of(row: &Row) -> Option<&str> {
    row.get("url").and_then(Value::as_str)
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => {
            let sa = a.map(|v| v.to_string()).unwrap_or_default();
            let sb = b.map(|v| v.to_string()).unwrap_or_default();
            sa.cmp(&sb)
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, StoreError> {
        self.record(Call::Insert {
            table: table.to_string(),
            rows: rows.to_vec(),
        });
        if self.fail_batches && rows.len() > 1 {
            return Err(http(500, "batch rejected"));
        }
        if let Some(bad) = rows
            .iter()
            .filter_map(url_of)
            .find(|u| self.rejected_urls.contains(*u))
        {
            return Err(http(400, format!("row rejected: {bad}")));
        }
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.entry(table.to_string()).or_default();
        for row in rows {
            if let Some(u) = url_of(row) {
                if existing.iter().any(|r| url_of(r) == Some(u)) {
                    return Err(http(409, format!("duplicate key value: url={u}")));
                }
            }
        }
        let mut stored = Vec::with_capacity(rows.len());
        let mut next_id = self.next_id.lock().unwrap();
        for row in rows {
            *next_id += 1;
            let mut out = Row::new();
            out.insert("id".to_string(), Value::from(*next_id));
            out.extend(row.clone());
            stored.push(out);
        }
        existing.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        patch: &Row,
        filter: &EqFilter,
    ) -> Result<Vec<Row>, StoreError> {
        self.record(Call::Update {
            table: table.to_string(),
            patch: patch.clone(),
            filter: filter.clone(),
        });
        let mut tables = self.tables.lock().unwrap();
        let Some(existing) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut updated = Vec::new();
        for row in existing.iter_mut() {
            let matches = row
                .get(&filter.column)
                .and_then(Value::as_str)
                .is_some_and(|v| v == filter.value);
            if matches {
                for (k, v) in patch {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Selection, StoreError> {
        self.record(Call::Select {
            table: table.to_string(),
            query: query.clone(),
        });
        if self.fail_selects {
            return Err(http(503, "service unavailable"));
        }
        let mut rows = self.rows(table);
        let total = rows.len() as u64;
        if let Some((column, order)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(column), b.get(column));
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }
        if let Some(n) = query.limit {
            rows.truncate(n);
        }
        let columns: Vec<&str> = query.columns.split(',').map(str::trim).collect();
        let data = if columns == ["*"] {
            rows
        } else {
            rows.into_iter()
                .map(|r| {
                    columns
                        .iter()
                        .map(|c| (c.to_string(), r.get(*c).cloned().unwrap_or(Value::Null)))
                        .collect()
                })
                .collect()
        };
        Ok(Selection {
            data,
            count: query.count_exact.then_some(total),
        })
    }
}
