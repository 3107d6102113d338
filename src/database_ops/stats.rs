use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::instrument;

use super::store::{Order, RemoteStore, SelectQuery};

pub const TOP_INDUSTRIES: usize = 5;
const UNKNOWN_PLATFORM: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndustryCount {
    pub name: String,
    pub content_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub total: u64,
    pub by_platform: BTreeMap<String, u64>,
    pub top_industries: Vec<IndustryCount>,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database statistics")?;
        writeln!(f, "Total videos: {}", self.total)?;
        writeln!(f)?;
        writeln!(f, "Videos by platform:")?;
        for (platform, count) in &self.by_platform {
            writeln!(f, "  {platform}: {count}")?;
        }
        if !self.top_industries.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top industries:")?;
            for industry in &self.top_industries {
                writeln!(f, "  {}: {} videos", industry.name, industry.content_count)?;
            }
        }
        Ok(())
    }
}

/// Read-only summary over the videos table and the `industries` aggregate.
///
/// The three queries are independent; counts may disagree if rows are
/// written in between.
pub struct Reporter<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    videos_table: String,
    industries_table: String,
}

impl<'a, S: RemoteStore + ?Sized> Reporter<'a, S> {
    pub fn new(
        store: &'a S,
        videos_table: impl Into<String>,
        industries_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            videos_table: videos_table.into(),
            industries_table: industries_table.into(),
        }
    }

    #[instrument(skip(self), fields(table = %self.videos_table))]
    pub async fn get_stats(&self) -> Result<StatsReport> {
        let total = self
            .store
            .select(&self.videos_table, &SelectQuery::new("id").count_exact())
            .await
            .with_context(|| format!("counting {}", self.videos_table))?;
        let total = total.count.unwrap_or(total.data.len() as u64);

        let platforms = self
            .store
            .select(&self.videos_table, &SelectQuery::new("platform"))
            .await
            .with_context(|| format!("reading platforms from {}", self.videos_table))?;
        let mut by_platform: BTreeMap<String, u64> = BTreeMap::new();
        for row in &platforms.data {
            let platform = row
                .get("platform")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_PLATFORM);
            *by_platform.entry(platform.to_string()).or_default() += 1;
        }

        let industries = self
            .store
            .select(
                &self.industries_table,
                &SelectQuery::new("name,content_count")
                    .order_by("content_count", Order::Desc)
                    .limit(TOP_INDUSTRIES),
            )
            .await
            .with_context(|| format!("reading top {}", self.industries_table))?;
        let top_industries = industries
            .data
            .iter()
            .map(|row| IndustryCount {
                name: row
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content_count: row
                    .get("content_count")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
            })
            .collect();

        Ok(StatsReport {
            total,
            by_platform,
            top_industries,
        })
    }
}
