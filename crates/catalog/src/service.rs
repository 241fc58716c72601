//! Catalog query orchestration.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument};

use catalog_common::{CatalogResult, Channel, DateValue, IndexRecord, MonthKey};

use crate::cache::IndexCache;
use crate::config::{CatalogConfig, ConfigError};
use crate::filter::{filter_records, sort_by_timestamp};
use crate::source::create_source;
use crate::validation::{DateRange, DateRangeValidator};

/// A validated catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQuery {
    pub start: DateValue,
    pub end: DateValue,
    pub channel: Channel,
}

impl CatalogQuery {
    pub fn new(range: DateRange, channel: Channel) -> Self {
        Self {
            start: range.start,
            end: range.end,
            channel,
        }
    }

    /// Months whose index files must be loaded to answer the query.
    pub fn months(&self) -> impl Iterator<Item = MonthKey> {
        MonthKey::range_inclusive(self.start.month_key(), self.end.month_key())
    }
}

/// Entry point for the UI: validates input, loads months, filters.
pub struct CatalogService {
    cache: Arc<IndexCache>,
    validator: DateRangeValidator,
    max_concurrent_fetches: usize,
}

impl CatalogService {
    pub fn new(
        cache: Arc<IndexCache>,
        validator: DateRangeValidator,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            cache,
            validator,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// Build the service, its cache and its index source from configuration.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, ConfigError> {
        let earliest = config.validate()?;
        let source = create_source(config).map_err(|e| ConfigError::Invalid {
            key: "base_url",
            message: e.to_string(),
        })?;

        info!(
            source = %source.describe(),
            earliest = %earliest,
            max_concurrent_fetches = config.max_concurrent_fetches,
            "Catalog service configured"
        );

        Ok(Self::new(
            Arc::new(IndexCache::new(source)),
            DateRangeValidator::new(earliest),
            config.max_concurrent_fetches,
        ))
    }

    pub fn cache(&self) -> &Arc<IndexCache> {
        &self.cache
    }

    /// Records on `channel` between two `YYYYMMDD` dates, oldest first.
    ///
    /// Invalid input is rejected before any index is fetched.
    #[instrument(skip(self))]
    pub async fn query(
        &self,
        start: &str,
        end: &str,
        channel: Channel,
    ) -> CatalogResult<Vec<Arc<IndexRecord>>> {
        let range = self.validator.validate(start, end)?;
        self.query_range(&CatalogQuery::new(range, channel)).await
    }

    /// Answer an already validated query.
    pub async fn query_range(&self, query: &CatalogQuery) -> CatalogResult<Vec<Arc<IndexRecord>>> {
        self.load_months(query.months().collect()).await?;

        let records = self.cache.records().await;
        let matched = filter_records(&records, &query.start, &query.end, query.channel);
        info!(
            start = %query.start,
            end = %query.end,
            channel = %query.channel,
            matched = matched.len(),
            "Catalog query answered"
        );
        Ok(matched)
    }

    /// Every record of one month, oldest first, optionally on one channel.
    ///
    /// Months outside the archive are rejected before any index is fetched.
    #[instrument(skip(self))]
    pub async fn month(
        &self,
        month: MonthKey,
        channel: Option<Channel>,
    ) -> CatalogResult<Vec<Arc<IndexRecord>>> {
        let month = self.validator.validate_month(month)?;
        self.cache.ensure_loaded(month).await?;

        let mut records: Vec<Arc<IndexRecord>> = self
            .cache
            .month_records(month)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| channel.is_none_or(|c| r.channel() == c))
            .collect();
        sort_by_timestamp(&mut records);
        Ok(records)
    }

    /// Load months with bounded concurrency; all loads finish before the
    /// first failure (in month order) is returned.
    async fn load_months(&self, months: Vec<MonthKey>) -> CatalogResult<()> {
        debug!(count = months.len(), "Loading month indexes");

        let results: Vec<CatalogResult<()>> = stream::iter(months)
            .map(|month| self.cache.ensure_loaded(month))
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        results.into_iter().collect()
    }
}
