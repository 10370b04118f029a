//! TTL-bounded caching decorator over any metadata provider

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use super::traits::{MetadataError, MetadataProvider, MetadataResult};
use crate::types::{
    CancellationToken, ColumnContext, ColumnIdentifier, GlossaryTerm, LineageDirection,
    LineageInfo, SearchFilter, TableContext, TableIdentifier, TableSearchResult,
};

const DEFAULT_TTL: Duration = Duration::from_secs(300);
const DEFAULT_MAX_ENTRIES: usize = 10_000;
const DEFAULT_ERROR_TTL: Duration = Duration::from_secs(60);

/// Cache tuning knobs. Zero values fall back to the defaults rather than
/// erroring.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a successful lookup stays fresh (default 5 min)
    pub ttl: Duration,
    /// Entry cap before eviction kicks in (default 10,000)
    pub max_entries: usize,
    /// Whether failed lookups are cached at all (default false)
    pub cache_errors: bool,
    /// How long a cached error stays fresh (default 1 min)
    pub error_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            cache_errors: false,
            error_ttl: DEFAULT_ERROR_TTL,
        }
    }
}

impl CacheConfig {
    fn normalized(mut self) -> Self {
        if self.ttl.is_zero() {
            self.ttl = DEFAULT_TTL;
        }
        if self.max_entries == 0 {
            self.max_entries = DEFAULT_MAX_ENTRIES;
        }
        if self.error_ttl.is_zero() {
            self.error_ttl = DEFAULT_ERROR_TTL;
        }
        self
    }
}

/// Counts reported by [`CachingProvider::stats`]. Computed by scanning;
/// taking stats never evicts anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
    pub max_entries: usize,
}

/// The five cacheable response shapes. Search results are deliberately not
/// here: filter combinations vary too much for a result-set cache to do
/// anything but thrash.
#[derive(Clone)]
enum CachedValue {
    Table(Option<TableContext>),
    Column(Option<ColumnContext>),
    Columns(Option<HashMap<String, ColumnContext>>),
    Lineage(Option<LineageInfo>),
    Glossary(Option<GlossaryTerm>),
}

struct CacheEntry {
    outcome: Result<CachedValue, Arc<MetadataError>>,
    expires_at: Instant,
}

/// Decorator adding a bounded, TTL-expiring memo layer over any provider.
///
/// Keys derive solely from request parameters, so identical requests always
/// hit the same slot. Absent metadata (`None`) is cached like any other
/// successful answer. A read, the wrapped call and the write are not one
/// transaction: two identical concurrent misses may both hit the wrapped
/// provider, which is duplicate work, not corruption.
pub struct CachingProvider {
    inner: Arc<dyn MetadataProvider>,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CacheEntry>>,
    name: String,
}

impl CachingProvider {
    pub fn new(inner: Arc<dyn MetadataProvider>) -> Self {
        Self::with_config(inner, CacheConfig::default())
    }

    pub fn with_config(inner: Arc<dyn MetadataProvider>, config: CacheConfig) -> Self {
        let name = format!("cached({})", inner.name());
        Self {
            inner,
            config: config.normalized(),
            entries: RwLock::new(HashMap::new()),
            name,
        }
    }

    /// Fresh entry for `key`, if any.
    fn lookup(&self, key: &str) -> Option<Result<CachedValue, Arc<MetadataError>>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.outcome.clone())
    }

    fn store(&self, key: String, outcome: Result<CachedValue, Arc<MetadataError>>) {
        let ttl = if outcome.is_err() {
            self.config.error_ttl
        } else {
            self.config.ttl
        };
        let mut entries = self.entries.write();
        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            // Evict the soonest-to-expire entry (O(n) scan, not LRU).
            let victim = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                entries.remove(&victim);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                outcome,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Pass a miss outcome back to the caller, storing it per config.
    fn record<T>(
        &self,
        key: String,
        result: MetadataResult<T>,
        wrap: impl FnOnce(T) -> CachedValue,
    ) -> MetadataResult<T>
    where
        T: Clone,
    {
        match result {
            Ok(value) => {
                self.store(key, Ok(wrap(value.clone())));
                Ok(value)
            }
            Err(err) => {
                if self.config.cache_errors {
                    let shared = Arc::new(err);
                    self.store(key, Err(shared.clone()));
                    Err(MetadataError::Cached(shared))
                } else {
                    Err(err)
                }
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let now = Instant::now();
        let expired = entries.values().filter(|e| e.expires_at <= now).count();
        CacheStats {
            total_entries: entries.len(),
            active_entries: entries.len() - expired,
            expired_entries: expired,
            max_entries: self.config.max_entries,
        }
    }

    /// Drop every entry by swapping in a fresh map.
    pub fn clear(&self) {
        *self.entries.write() = HashMap::new();
    }
}

#[async_trait]
impl MetadataProvider for CachingProvider {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn table_context(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<TableContext>> {
        let key = format!("table:{}", table.key());
        if let Some(outcome) = self.lookup(&key) {
            return match outcome {
                Ok(CachedValue::Table(v)) => Ok(v),
                Ok(_) => Ok(None), // unreachable under the key-prefix discipline
                Err(e) => Err(MetadataError::Cached(e)),
            };
        }
        let result = self.inner.table_context(cancel, table).await;
        self.record(key, result, CachedValue::Table)
    }

    async fn column_context(
        &self,
        cancel: &CancellationToken,
        column: &ColumnIdentifier,
    ) -> MetadataResult<Option<ColumnContext>> {
        let key = format!("column:{}", column.key());
        if let Some(outcome) = self.lookup(&key) {
            return match outcome {
                Ok(CachedValue::Column(v)) => Ok(v),
                Ok(_) => Ok(None),
                Err(e) => Err(MetadataError::Cached(e)),
            };
        }
        let result = self.inner.column_context(cancel, column).await;
        self.record(key, result, CachedValue::Column)
    }

    async fn columns_context(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<HashMap<String, ColumnContext>>> {
        let key = format!("columns:{}", table.key());
        if let Some(outcome) = self.lookup(&key) {
            return match outcome {
                Ok(CachedValue::Columns(v)) => Ok(v),
                Ok(_) => Ok(None),
                Err(e) => Err(MetadataError::Cached(e)),
            };
        }
        let result = self.inner.columns_context(cancel, table).await;
        self.record(key, result, CachedValue::Columns)
    }

    async fn lineage(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
        direction: LineageDirection,
        max_depth: u32,
    ) -> MetadataResult<Option<LineageInfo>> {
        // Direction and depth are part of the key so distinct walks never
        // collide.
        let key = format!("lineage:{}:{}:{}", table.key(), direction.as_str(), max_depth);
        if let Some(outcome) = self.lookup(&key) {
            return match outcome {
                Ok(CachedValue::Lineage(v)) => Ok(v),
                Ok(_) => Ok(None),
                Err(e) => Err(MetadataError::Cached(e)),
            };
        }
        let result = self.inner.lineage(cancel, table, direction, max_depth).await;
        self.record(key, result, CachedValue::Lineage)
    }

    async fn glossary_term(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> MetadataResult<Option<GlossaryTerm>> {
        let key = format!("glossary:{}", term);
        if let Some(outcome) = self.lookup(&key) {
            return match outcome {
                Ok(CachedValue::Glossary(v)) => Ok(v),
                Ok(_) => Ok(None),
                Err(e) => Err(MetadataError::Cached(e)),
            };
        }
        let result = self.inner.glossary_term(cancel, term).await;
        self.record(key, result, CachedValue::Glossary)
    }

    async fn search_tables(
        &self,
        cancel: &CancellationToken,
        filter: &SearchFilter,
    ) -> MetadataResult<Vec<TableSearchResult>> {
        // Never cached; straight pass-through.
        self.inner.search_tables(cancel, filter).await
    }

    async fn close(&self) -> MetadataResult<()> {
        self.clear();
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::super::delegate::DelegatingProvider;

    fn table() -> TableIdentifier {
        TableIdentifier::new("hive", "sales", "orders")
    }

    fn counting_provider(calls: Arc<AtomicUsize>) -> Arc<dyn MetadataProvider> {
        Arc::new(DelegatingProvider::named("backend").on_table_context(move |t| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TableContext::new(t.clone(), "backend")))
        }))
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachingProvider::new(counting_provider(calls.clone()));
        let cancel = CancellationToken::new();

        let first = cache.table_context(&cancel, &table()).await.unwrap();
        let second = cache.table_context(&cancel, &table()).await.unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reprobes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachingProvider::with_config(
            counting_provider(calls.clone()),
            CacheConfig {
                ttl: Duration::from_millis(50),
                ..CacheConfig::default()
            },
        );
        let cancel = CancellationToken::new();

        cache.table_context(&cancel, &table()).await.unwrap();
        cache.table_context(&cancel, &table()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.table_context(&cancel, &table()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_absent_metadata_is_cached_too() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Arc::new(DelegatingProvider::new().on_table_context(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }));
        let cache = CachingProvider::new(inner);
        let cancel = CancellationToken::new();

        assert!(cache.table_context(&cancel, &table()).await.unwrap().is_none());
        assert!(cache.table_context(&cancel, &table()).await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_not_cached_by_default() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Arc::new(DelegatingProvider::new().on_table_context(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(MetadataError::unavailable("backend", "down"))
        }));
        let cache = CachingProvider::new(inner);
        let cancel = CancellationToken::new();

        assert!(cache.table_context(&cancel, &table()).await.is_err());
        assert!(cache.table_context(&cancel, &table()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_cached_when_enabled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Arc::new(DelegatingProvider::new().on_table_context(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(MetadataError::unavailable("backend", "down"))
        }));
        let cache = CachingProvider::with_config(
            inner,
            CacheConfig {
                cache_errors: true,
                ..CacheConfig::default()
            },
        );
        let cancel = CancellationToken::new();

        let first = cache.table_context(&cancel, &table()).await.unwrap_err();
        let second = cache.table_context(&cancel, &table()).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[tokio::test]
    async fn test_cached_error_expires_after_error_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Arc::new(DelegatingProvider::new().on_table_context(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(MetadataError::unavailable("backend", "down"))
        }));
        let cache = CachingProvider::with_config(
            inner,
            CacheConfig {
                cache_errors: true,
                error_ttl: Duration::from_millis(50),
                ..CacheConfig::default()
            },
        );
        let cancel = CancellationToken::new();

        assert!(cache.table_context(&cancel, &table()).await.is_err());
        assert!(cache.table_context(&cancel, &table()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.table_context(&cancel, &table()).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_is_never_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Arc::new(DelegatingProvider::new().on_search_tables(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }));
        let cache = CachingProvider::new(inner);
        let cancel = CancellationToken::new();
        let filter = SearchFilter::all();

        cache.search_tables(&cancel, &filter).await.unwrap();
        cache.search_tables(&cancel, &filter).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lineage_key_encodes_direction_and_depth() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = Arc::new(DelegatingProvider::new().on_lineage(move |t, direction, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(LineageInfo {
                table: t.clone(),
                direction,
                edges: Vec::new(),
            }))
        }));
        let cache = CachingProvider::new(inner);
        let cancel = CancellationToken::new();
        let t = table();

        cache.lineage(&cancel, &t, LineageDirection::Upstream, 1).await.unwrap();
        cache.lineage(&cancel, &t, LineageDirection::Downstream, 1).await.unwrap();
        cache.lineage(&cancel, &t, LineageDirection::Upstream, 2).await.unwrap();
        // repeats of each hit the cache
        cache.lineage(&cancel, &t, LineageDirection::Upstream, 1).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_eviction_bound_single_threaded() {
        let inner = Arc::new(
            DelegatingProvider::new()
                .on_table_context(|t| Ok(Some(TableContext::new(t.clone(), "x")))),
        );
        let cache = CachingProvider::with_config(
            inner,
            CacheConfig {
                max_entries: 10,
                ..CacheConfig::default()
            },
        );
        let cancel = CancellationToken::new();

        for i in 0..25 {
            let t = TableIdentifier::new("hive", "sales", format!("t{}", i));
            cache.table_context(&cancel, &t).await.unwrap();
        }

        assert!(cache.stats().total_entries <= 10);
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachingProvider::new(counting_provider(calls));
        let cancel = CancellationToken::new();

        cache.table_context(&cancel, &table()).await.unwrap();
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.active_entries, 1);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.max_entries, 10_000);

        cache.clear();
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_close_closes_inner_and_clears() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        let inner = Arc::new(DelegatingProvider::new().on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        let cache = CachingProvider::new(inner);
        let cancel = CancellationToken::new();

        cache.table_context(&cancel, &table()).await.unwrap();
        cache.close().await.unwrap();

        assert_eq!(cache.stats().total_entries, 0);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_name_wraps_inner() {
        let cache = CachingProvider::new(Arc::new(super::super::noop::NoopProvider));
        assert_eq!(cache.name(), "cached(noop)");
    }

    #[test]
    fn test_zero_config_values_fall_back_to_defaults() {
        let config = CacheConfig {
            ttl: Duration::ZERO,
            max_entries: 0,
            cache_errors: false,
            error_ttl: Duration::ZERO,
        }
        .normalized();
        assert_eq!(config.ttl, DEFAULT_TTL);
        assert_eq!(config.max_entries, DEFAULT_MAX_ENTRIES);
        assert_eq!(config.error_ttl, DEFAULT_ERROR_TTL);
    }
}
