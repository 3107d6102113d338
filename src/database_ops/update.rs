use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, instrument, warn};

use super::store::{EqFilter, RemoteStore, Row};
use crate::normalization::fields::HOOK_UPDATE_FIELDS;
use crate::normalization::RawRecord;

/// Column identifying a video for updates.
pub const URL_COLUMN: &str = "url";

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Row),
    /// No row has this url. Not treated as an error.
    NotFound,
}

/// Update payload built from user-facing field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookPatch {
    pub patch: Row,
    /// Keys outside the allow-list.
    pub dropped: Vec<String>,
}

/// Keep allow-listed, non-null fields under their column names.
pub fn build_hook_patch(updates: &RawRecord) -> HookPatch {
    let mut out = HookPatch::default();
    for (key, value) in updates {
        match HOOK_UPDATE_FIELDS.iter().find(|(ext, _)| ext == key) {
            Some((_, column)) if !value.is_null() => {
                out.patch.insert((*column).to_string(), value.clone());
            }
            Some(_) => {}
            None => out.dropped.push(key.clone()),
        }
    }
    out
}

/// Partial updates of hook metadata on `viral_videos`, keyed by url.
pub struct Updater<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    table: String,
}

impl<'a, S: RemoteStore + ?Sized> Updater<'a, S> {
    pub fn new(store: &'a S, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    #[instrument(skip(self, updates), fields(table = %self.table))]
    pub async fn update_by_url(&self, url: &str, updates: &RawRecord) -> Result<UpdateOutcome> {
        let HookPatch { patch, dropped } = build_hook_patch(updates);
        if !dropped.is_empty() {
            debug!(?dropped, "ignoring fields outside the update allow-list");
        }
        if patch.is_empty() {
            bail!("nothing to update for {url}: no allow-listed, non-null fields given");
        }

        let filter = EqFilter::new(URL_COLUMN, url);
        let rows = match self.store.update(&self.table, &patch, &filter).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "update failed");
                return Err(e).with_context(|| format!("update of {url} in {} failed", self.table));
            }
        };
        match rows.into_iter().next() {
            Some(row) => {
                info!("updated record");
                Ok(UpdateOutcome::Updated(row))
            }
            None => {
                warn!("no record matched url");
                Ok(UpdateOutcome::NotFound)
            }
        }
    }
}
