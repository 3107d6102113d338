pub mod ingest;
pub mod postgrest;
pub mod stats;
pub mod store;
pub mod tables;
pub mod update;

#[cfg(test)]
pub(crate) mod testing;

pub use ingest::{BatchOutcome, FailedRecord, Ingestor};
pub use postgrest::{PostgrestConfig, PostgrestStore};
pub use stats::{Reporter, StatsReport};
pub use store::{EqFilter, Order, RemoteStore, Row, SelectQuery, Selection, StoreError};
pub use tables::Tables;
pub use update::{UpdateOutcome, Updater};
