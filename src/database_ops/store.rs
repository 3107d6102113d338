use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A row as returned by (or sent to) the remote store.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("other: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// `column = value` row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqFilter {
    pub column: String,
    pub value: String,
}

impl EqFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Comma separated column list, as PostgREST's `select=`.
    pub columns: String,
    pub order: Option<(String, Order)>,
    pub limit: Option<usize>,
    /// Ask for the exact row count alongside the data.
    pub count_exact: bool,
}

impl SelectQuery {
    pub fn new(columns: impl Into<String>) -> Self {
        Self {
            columns: columns.into(),
            order: None,
            limit: None,
            count_exact: false,
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub data: Vec<Row>,
    /// Present when the query asked for an exact count.
    pub count: Option<u64>,
}

/// The hosted database as seen by the ingestion pipeline.
///
/// Every call is one round trip; there is no transaction spanning calls.
/// A batch insert is all-or-nothing on the remote side.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert `rows` and return them as stored (ids and defaults filled).
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, StoreError>;

    /// Apply `patch` to every row matching `filter`; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        patch: &Row,
        filter: &EqFilter,
    ) -> Result<Vec<Row>, StoreError>;

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Selection, StoreError>;
}
