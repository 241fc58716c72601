//! Per-month cache of index files and the metadata derived from them.
//!
//! ## Lifecycle
//! A month's entry is created the first time it loads successfully and is
//! never evicted or refreshed; published months do not change upstream.
//! Failed fetches and malformed files remove the month from the map so a
//! later call retries.
//!
//! ## Concurrency
//! A month being loaded holds one shared load future. Concurrent
//! `ensure_loaded` calls for that month await the same future and all see
//! its outcome, success or failure, so only one request is issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use catalog_common::{CatalogError, CatalogResult, IndexRecord, MonthKey};

use crate::parser::parse_index;
use crate::source::IndexSource;

/// Raw index text for one month plus the records parsed from it.
#[derive(Debug)]
pub struct IndexCacheEntry {
    pub month: MonthKey,
    pub raw: Arc<str>,
    pub records: Vec<Arc<IndexRecord>>,
}

type SharedLoad = Shared<BoxFuture<'static, CatalogResult<Arc<IndexCacheEntry>>>>;

/// State of one month in the cache map.
enum MonthSlot {
    /// A load is in flight; `id` tells successive attempts apart.
    Loading { id: u64, load: SharedLoad },
    Loaded(Arc<IndexCacheEntry>),
}

/// Filename-keyed record map that remembers first-insertion order.
#[derive(Debug, Default)]
struct MetadataMap {
    records: Vec<Arc<IndexRecord>>,
    positions: HashMap<String, usize>,
}

impl MetadataMap {
    /// Insert or replace in place. Returns true if the filename was new.
    fn upsert(&mut self, record: Arc<IndexRecord>) -> bool {
        match self.positions.get(record.filename()) {
            Some(&pos) => {
                self.records[pos] = record;
                false
            }
            None => {
                self.positions
                    .insert(record.filename().to_string(), self.records.len());
                self.records.push(record);
                true
            }
        }
    }
}

/// Statistics for the index cache.
#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Loads answered from a cached month or by joining an in-flight load.
    pub hits: u64,
    /// Index fetches issued to the source.
    pub fetches: u64,
    /// Fetches or parses that failed.
    pub failures: u64,
    /// Months currently cached.
    pub months: usize,
    /// Distinct records in the metadata map.
    pub records: usize,
}

/// Month-keyed index cache backed by an [`IndexSource`].
pub struct IndexCache {
    source: Arc<dyn IndexSource>,
    months: Mutex<HashMap<MonthKey, MonthSlot>>,
    metadata: RwLock<MetadataMap>,
    counters: Arc<CacheCounters>,
    next_load_id: AtomicU64,
}

impl IndexCache {
    pub fn new(source: Arc<dyn IndexSource>) -> Self {
        info!(source = %source.describe(), "IndexCache initialized");
        Self {
            source,
            months: Mutex::new(HashMap::new()),
            metadata: RwLock::new(MetadataMap::default()),
            counters: Arc::new(CacheCounters::default()),
            next_load_id: AtomicU64::new(0),
        }
    }

    /// Make sure `month`'s records are in the metadata map.
    ///
    /// A cached month is re-applied without I/O. A month already being
    /// loaded is awaited. Otherwise the index is fetched once, parsed,
    /// cached and merged.
    #[instrument(skip_all, fields(month = %month))]
    pub async fn ensure_loaded(&self, month: MonthKey) -> CatalogResult<()> {
        let (id, load) = {
            let mut months = self.months.lock().await;
            match months.get(&month) {
                Some(MonthSlot::Loaded(entry)) => {
                    let entry = Arc::clone(entry);
                    drop(months);
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(records = entry.records.len(), "Index cache hit");
                    self.merge(&entry).await;
                    return Ok(());
                }
                Some(MonthSlot::Loading { id, load }) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    debug!("Joining in-flight index load");
                    (*id, load.clone())
                }
                None => {
                    let id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
                    let load = load_month(
                        Arc::clone(&self.source),
                        Arc::clone(&self.counters),
                        month,
                    )
                    .boxed()
                    .shared();
                    months.insert(
                        month,
                        MonthSlot::Loading {
                            id,
                            load: load.clone(),
                        },
                    );
                    (id, load)
                }
            }
        };

        let result = load.await;
        self.settle(month, id, &result).await;
        let entry = result?;
        self.merge(&entry).await;
        Ok(())
    }

    /// Replace the in-flight slot with the outcome of load `id`.
    ///
    /// Only the slot of that same attempt is touched, so a late waiter
    /// cannot clobber a newer retry.
    async fn settle(
        &self,
        month: MonthKey,
        id: u64,
        result: &CatalogResult<Arc<IndexCacheEntry>>,
    ) {
        let mut months = self.months.lock().await;
        let same_attempt = matches!(
            months.get(&month),
            Some(MonthSlot::Loading { id: current, .. }) if *current == id
        );
        if !same_attempt {
            return;
        }
        match result {
            Ok(entry) => {
                months.insert(month, MonthSlot::Loaded(Arc::clone(entry)));
            }
            Err(_) => {
                months.remove(&month);
            }
        }
    }

    async fn merge(&self, entry: &IndexCacheEntry) {
        let mut metadata = self.metadata.write().await;
        let mut added = 0;
        for record in &entry.records {
            if metadata.upsert(Arc::clone(record)) {
                added += 1;
            }
        }
        if added > 0 {
            debug!(month = %entry.month, added, total = metadata.records.len(), "Merged records");
        }
    }

    async fn entry(&self, month: MonthKey) -> Option<Arc<IndexCacheEntry>> {
        let months = self.months.lock().await;
        match months.get(&month) {
            Some(MonthSlot::Loaded(entry)) => Some(Arc::clone(entry)),
            _ => None,
        }
    }

    /// Whether `month` has been loaded successfully.
    pub async fn is_cached(&self, month: MonthKey) -> bool {
        self.entry(month).await.is_some()
    }

    /// Loaded months in ascending order.
    pub async fn cached_months(&self) -> Vec<MonthKey> {
        let months = self.months.lock().await;
        let mut loaded: Vec<MonthKey> = months
            .iter()
            .filter(|(_, slot)| matches!(slot, MonthSlot::Loaded(_)))
            .map(|(month, _)| *month)
            .collect();
        loaded.sort();
        loaded
    }

    /// Raw index text of a loaded month.
    pub async fn raw_text(&self, month: MonthKey) -> Option<Arc<str>> {
        self.entry(month).await.map(|e| Arc::clone(&e.raw))
    }

    /// Records of a loaded month, in file order.
    pub async fn month_records(&self, month: MonthKey) -> Option<Vec<Arc<IndexRecord>>> {
        self.entry(month).await.map(|e| e.records.clone())
    }

    /// Snapshot of every known record, in first-insertion order.
    pub async fn records(&self) -> Vec<Arc<IndexRecord>> {
        self.metadata.read().await.records.clone()
    }

    /// Look up a record by filename.
    pub async fn get(&self, filename: &str) -> Option<Arc<IndexRecord>> {
        let metadata = self.metadata.read().await;
        metadata
            .positions
            .get(filename)
            .map(|&pos| Arc::clone(&metadata.records[pos]))
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            months: self.cached_months().await.len(),
            records: self.metadata.read().await.records.len(),
        }
    }
}

/// Fetch and parse one month. Runs once per attempt, however many callers wait on it.
async fn load_month(
    source: Arc<dyn IndexSource>,
    counters: Arc<CacheCounters>,
    month: MonthKey,
) -> CatalogResult<Arc<IndexCacheEntry>> {
    counters.fetches.fetch_add(1, Ordering::Relaxed);

    let raw = source.fetch_index(month).await.map_err(|source| {
        counters.failures.fetch_add(1, Ordering::Relaxed);
        warn!(month = %month, error = %source, "Index fetch failed");
        CatalogError::Fetch { month, source }
    })?;

    let records = parse_index(month, &raw).map_err(|e| {
        counters.failures.fetch_add(1, Ordering::Relaxed);
        warn!(month = %month, error = %e, "Index parse failed");
        e
    })?;

    info!(month = %month, records = records.len(), "Loaded month index");

    Ok(Arc::new(IndexCacheEntry {
        month,
        raw: Arc::from(raw),
        records: records.into_iter().map(Arc::new).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryIndexSource;
    use catalog_common::{FetchError, ParseError};
    use std::time::Duration;

    const JAN: &str = "201501010000.VIS.FULL.png\tX\t[0,0,100,100]\t[0,255]\n\
                       201501010000.IR1.FULL.png\tX\t[0,0,100,100]\t[0,255]\n";

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn cache_with(source: MemoryIndexSource) -> (Arc<MemoryIndexSource>, IndexCache) {
        let source = Arc::new(source);
        let cache = IndexCache::new(source.clone());
        (source, cache)
    }

    #[test]
    fn test_metadata_map_upsert_keeps_position() {
        let mut map = MetadataMap::default();
        let a = Arc::new(
            crate::parser::parse_index(month("201501"), JAN)
                .unwrap()
                .remove(0),
        );
        assert!(map.upsert(a.clone()));
        assert!(!map.upsert(a.clone()));
        assert_eq!(map.records.len(), 1);
        assert_eq!(map.positions[a.filename()], 0);
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once() {
        let source = MemoryIndexSource::new();
        source.insert(month("201501"), JAN);
        let (source, cache) = cache_with(source);

        cache.ensure_loaded(month("201501")).await.unwrap();
        let first: Vec<IndexRecord> = cache.records().await.iter().map(|r| (**r).clone()).collect();

        cache.ensure_loaded(month("201501")).await.unwrap();
        let second: Vec<IndexRecord> = cache.records().await.iter().map(|r| (**r).clone()).collect();

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.months, 1);
        assert_eq!(stats.records, 2);
        assert_eq!(cache.raw_text(month("201501")).await.as_deref(), Some(JAN));
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_coalesced() {
        let source = MemoryIndexSource::new().with_latency(Duration::from_millis(50));
        source.insert(month("201501"), JAN);
        let (source, cache) = cache_with(source);
        let cache = Arc::new(cache);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.ensure_loaded(month("201501")).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.records().await.len(), 2);

        let stats = cache.stats().await;
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 7);
    }

    #[tokio::test]
    async fn test_concurrent_failure_is_shared() {
        let source = MemoryIndexSource::new().with_latency(Duration::from_millis(100));
        let (source, cache) = cache_with(source);
        let cache = Arc::new(cache);

        let started = std::time::Instant::now();
        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.ensure_loaded(month("201501")).await })
            })
            .collect();
        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert!(matches!(
                err,
                CatalogError::Fetch {
                    source: FetchError::Missing(_),
                    ..
                }
            ));
        }

        assert_eq!(source.fetch_count(), 1);
        assert!(started.elapsed() < Duration::from_millis(400));
        assert!(cache.months.lock().await.is_empty());

        let stats = cache.stats().await;
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.hits, 4);
    }

    #[tokio::test]
    async fn test_failed_months_are_not_retained() {
        let (source, cache) = cache_with(MemoryIndexSource::new());

        for year in 2014..2034 {
            let m = MonthKey::new(year, 6).unwrap();
            assert!(cache.ensure_loaded(m).await.is_err());
        }

        assert_eq!(source.fetch_count(), 20);
        assert!(cache.months.lock().await.is_empty());
        assert!(cache.cached_months().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_month_absent() {
        let source = MemoryIndexSource::new();
        source.insert(month("201501"), JAN);
        source.fail_next(month("201501"), 1);
        let (source, cache) = cache_with(source);

        let err = cache.ensure_loaded(month("201501")).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Fetch {
                source: FetchError::Status { status: 503, .. },
                ..
            }
        ));
        assert!(!cache.is_cached(month("201501")).await);
        assert!(cache.records().await.is_empty());

        cache.ensure_loaded(month("201501")).await.unwrap();
        assert!(cache.is_cached(month("201501")).await);
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(cache.stats().await.failures, 1);
    }

    #[tokio::test]
    async fn test_parse_failure_fails_month() {
        let source = MemoryIndexSource::new();
        source.insert(
            month("201501"),
            "201501010000.VIS.FULL.png\tX\t[0,0,100,100]\t[0,255]\nbroken line\n",
        );
        let (_source, cache) = cache_with(source);

        let err = cache.ensure_loaded(month("201501")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(ParseError { line: 2, .. })));
        assert!(!cache.is_cached(month("201501")).await);
        assert!(cache.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_months_accumulate_in_order() {
        let source = MemoryIndexSource::new();
        source.insert(month("201501"), JAN);
        source.insert(
            month("201412"),
            "201412310000.IR1.NORTH.png\tX\t[0,0,1,1]\t[0,1]\n",
        );
        let (_source, cache) = cache_with(source);

        cache.ensure_loaded(month("201501")).await.unwrap();
        cache.ensure_loaded(month("201412")).await.unwrap();

        assert_eq!(
            cache.cached_months().await,
            vec![month("201412"), month("201501")]
        );
        let names: Vec<String> = cache
            .records()
            .await
            .iter()
            .map(|r| r.filename().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "201501010000.VIS.FULL.png",
                "201501010000.IR1.FULL.png",
                "201412310000.IR1.NORTH.png"
            ]
        );
        assert!(cache.get("201412310000.IR1.NORTH.png").await.is_some());
        assert_eq!(cache.month_records(month("201412")).await.unwrap().len(), 1);
    }
}
