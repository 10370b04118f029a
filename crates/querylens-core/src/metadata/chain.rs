//! Ordered provider composition with fallback and merge semantics

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{MetadataProvider, MetadataResult};
use crate::types::{
    CancellationToken, ColumnContext, ColumnIdentifier, GlossaryTerm, LineageDirection,
    LineageInfo, SearchFilter, TableContext, TableIdentifier, TableSearchResult,
};

/// Composes an ordered list of providers behind the single-provider
/// contract.
///
/// Single-value lookups are first-match-wins with fail-fast on errors: an
/// earlier provider's connectivity fault is never silently masked by a
/// later provider that happens to work. Column maps merge across providers
/// with later entries overriding earlier ones; search results combine and
/// dedup on the canonical table key.
///
/// `append` is safe before the chain sees concurrent traffic; mutating a
/// chain that is actively serving lookups is the caller's responsibility.
pub struct ProviderChain {
    providers: RwLock<Vec<Arc<dyn MetadataProvider>>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn MetadataProvider>>) -> Self {
        Self {
            providers: RwLock::new(providers),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Add a provider at the end of the chain.
    pub fn append(&self, provider: Arc<dyn MetadataProvider>) {
        self.providers.write().push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn MetadataProvider>> {
        self.providers.read().clone()
    }
}

#[async_trait]
impl MetadataProvider for ProviderChain {
    fn name(&self) -> String {
        let providers = self.snapshot();
        match providers.as_slice() {
            [] => "chain(empty)".to_string(),
            [single] => single.name(),
            many => {
                let names: Vec<String> = many.iter().map(|p| p.name()).collect();
                format!("chain({})", names.join(","))
            }
        }
    }

    async fn table_context(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<TableContext>> {
        for provider in self.snapshot() {
            if let Some(ctx) = provider.table_context(cancel, table).await? {
                return Ok(Some(ctx));
            }
        }
        Ok(None)
    }

    async fn column_context(
        &self,
        cancel: &CancellationToken,
        column: &ColumnIdentifier,
    ) -> MetadataResult<Option<ColumnContext>> {
        for provider in self.snapshot() {
            if let Some(ctx) = provider.column_context(cancel, column).await? {
                return Ok(Some(ctx));
            }
        }
        Ok(None)
    }

    async fn columns_context(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<HashMap<String, ColumnContext>>> {
        let mut merged: HashMap<String, ColumnContext> = HashMap::new();
        for provider in self.snapshot() {
            if let Some(map) = provider.columns_context(cancel, table).await? {
                // later providers win on key collision
                merged.extend(map);
            }
        }
        if merged.is_empty() {
            Ok(None)
        } else {
            Ok(Some(merged))
        }
    }

    async fn lineage(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
        direction: LineageDirection,
        max_depth: u32,
    ) -> MetadataResult<Option<LineageInfo>> {
        for provider in self.snapshot() {
            if let Some(info) = provider.lineage(cancel, table, direction, max_depth).await? {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    async fn glossary_term(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> MetadataResult<Option<GlossaryTerm>> {
        for provider in self.snapshot() {
            if let Some(t) = provider.glossary_term(cancel, term).await? {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }

    async fn search_tables(
        &self,
        cancel: &CancellationToken,
        filter: &SearchFilter,
    ) -> MetadataResult<Vec<TableSearchResult>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut combined = Vec::new();
        for provider in self.snapshot() {
            for result in provider.search_tables(cancel, filter).await? {
                if seen.insert(result.table.key()) {
                    combined.push(result);
                }
            }
        }
        Ok(combined)
    }

    /// Close every provider even when an earlier one fails; the first error
    /// is reported.
    async fn close(&self) -> MetadataResult<()> {
        let mut first_err = None;
        for provider in self.snapshot() {
            if let Err(e) = provider.close().await {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::super::delegate::DelegatingProvider;
    use super::super::noop::NoopProvider;
    use super::super::traits::MetadataError;
    use crate::types::TableContext;

    fn table() -> TableIdentifier {
        TableIdentifier::new("hive", "sales", "orders")
    }

    fn cancel() -> CancellationToken {
        CancellationToken::new()
    }

    fn value_provider(name: &'static str) -> Arc<dyn MetadataProvider> {
        Arc::new(
            DelegatingProvider::named(name)
                .on_table_context(move |t| Ok(Some(TableContext::new(t.clone(), name)))),
        )
    }

    fn failing_provider(name: &'static str) -> Arc<dyn MetadataProvider> {
        Arc::new(
            DelegatingProvider::named(name)
                .on_table_context(move |_| Err(MetadataError::unavailable(name, "down"))),
        )
    }

    #[test]
    fn test_names() {
        assert_eq!(ProviderChain::empty().name(), "chain(empty)");

        let single = ProviderChain::new(vec![Arc::new(NoopProvider)]);
        assert_eq!(single.name(), "noop");

        let chain = ProviderChain::new(vec![value_provider("a"), value_provider("b")]);
        assert_eq!(chain.name(), "chain(a,b)");
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let chain = ProviderChain::new(vec![value_provider("first"), value_provider("second")]);
        let ctx = chain.table_context(&cancel(), &table()).await.unwrap().unwrap();
        assert_eq!(ctx.source, "first");
    }

    #[tokio::test]
    async fn test_fallthrough_to_later_provider() {
        let chain = ProviderChain::new(vec![Arc::new(NoopProvider), value_provider("second")]);
        let ctx = chain.table_context(&cancel(), &table()).await.unwrap().unwrap();
        assert_eq!(ctx.source, "second");
    }

    #[tokio::test]
    async fn test_all_absent_is_absent() {
        let chain = ProviderChain::new(vec![Arc::new(NoopProvider), Arc::new(NoopProvider)]);
        assert!(chain.table_context(&cancel(), &table()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_fast_skips_later_providers() {
        let later_calls = Arc::new(AtomicUsize::new(0));
        let counter = later_calls.clone();
        let second = Arc::new(DelegatingProvider::named("second").on_table_context(move |t| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TableContext::new(t.clone(), "second")))
        }));

        let chain = ProviderChain::new(vec![failing_provider("first"), second]);
        let err = chain.table_context(&cancel(), &table()).await.unwrap_err();

        assert!(err.to_string().contains("first"));
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_columns_merge_disjoint_keys() {
        let t = table();
        let a = Arc::new(DelegatingProvider::named("a").on_columns_context(move |t| {
            let mut map = HashMap::new();
            map.insert(
                "col1".to_string(),
                ColumnContext::new(t.column("col1"), "a"),
            );
            Ok(Some(map))
        }));
        let b = Arc::new(DelegatingProvider::named("b").on_columns_context(move |t| {
            let mut map = HashMap::new();
            map.insert(
                "col2".to_string(),
                ColumnContext::new(t.column("col2"), "b"),
            );
            Ok(Some(map))
        }));

        let chain = ProviderChain::new(vec![a, b]);
        let merged = chain.columns_context(&cancel(), &t).await.unwrap().unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["col1"].source, "a");
        assert_eq!(merged["col2"].source, "b");
    }

    #[tokio::test]
    async fn test_columns_later_provider_overrides() {
        let make = |name: &'static str, description: &'static str| {
            Arc::new(DelegatingProvider::named(name).on_columns_context(move |t| {
                let mut ctx = ColumnContext::new(t.column("col1"), name);
                ctx.description = Some(description.to_string());
                let mut map = HashMap::new();
                map.insert("col1".to_string(), ctx);
                Ok(Some(map))
            }))
        };

        let chain = ProviderChain::new(vec![make("a", "from a"), make("b", "from b")]);
        let merged = chain.columns_context(&cancel(), &table()).await.unwrap().unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["col1"].description.as_deref(), Some("from b"));
    }

    #[tokio::test]
    async fn test_columns_no_contribution_is_none() {
        let chain = ProviderChain::new(vec![Arc::new(NoopProvider), Arc::new(NoopProvider)]);
        assert!(chain.columns_context(&cancel(), &table()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_dedups_on_table_key() {
        let hit = |name: &'static str| {
            Arc::new(DelegatingProvider::named(name).on_search_tables(move |_| {
                Ok(vec![TableSearchResult {
                    table: TableIdentifier::new("hive", "sales", "orders"),
                    description: None,
                    tags: Vec::new(),
                    domain: None,
                    deprecated: false,
                    source: name.to_string(),
                }])
            }))
        };

        let chain = ProviderChain::new(vec![hit("a"), hit("b")]);
        let results = chain.search_tables(&cancel(), &SearchFilter::all()).await.unwrap();

        assert_eq!(results.len(), 1);
        // first-seen wins
        assert_eq!(results[0].source, "a");
    }

    #[tokio::test]
    async fn test_search_error_fails_fast() {
        let failing = Arc::new(
            DelegatingProvider::named("bad")
                .on_search_tables(|_| Err(MetadataError::unavailable("bad", "down"))),
        );
        let chain = ProviderChain::new(vec![failing, Arc::new(NoopProvider)]);
        assert!(chain.search_tables(&cancel(), &SearchFilter::all()).await.is_err());
    }

    #[tokio::test]
    async fn test_close_closes_all_and_returns_first_error() {
        let closed = Arc::new(AtomicUsize::new(0));

        let fail_close = |name: &'static str, counter: Arc<AtomicUsize>| {
            Arc::new(DelegatingProvider::named(name).on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(MetadataError::unavailable(name, "close failed"))
            }))
        };
        let ok_close = |counter: Arc<AtomicUsize>| {
            Arc::new(DelegatingProvider::new().on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
        };

        let chain = ProviderChain::new(vec![
            fail_close("first", closed.clone()),
            fail_close("second", closed.clone()),
            ok_close(closed.clone()),
        ]);

        let err = chain.close().await.unwrap_err();
        assert!(err.to_string().contains("first"));
        assert_eq!(closed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_append_and_len() {
        let chain = ProviderChain::empty();
        assert!(chain.is_empty());

        chain.append(value_provider("a"));
        chain.append(value_provider("b"));
        assert_eq!(chain.len(), 2);

        let ctx = chain.table_context(&cancel(), &table()).await.unwrap().unwrap();
        assert_eq!(ctx.source, "a");
    }
}
