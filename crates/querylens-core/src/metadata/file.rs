//! File-backed metadata provider (YAML)
//!
//! Loads a metadata document once into in-memory indexes keyed by canonical
//! identifier strings. `reload` re-reads the file; an optional periodic
//! reload task is the only background work this crate ever spawns.
//!
//! Document shape:
//!
//! ```yaml
//! tables:
//!   - catalog: hive
//!     schema: sales
//!     table: orders
//!     description: All customer orders
//!     domain: commerce
//!     owners:
//!       - { id: u1, name: alice, type: user, role: steward }
//!     tags:
//!       - { name: pii }
//!     columns:
//!       order_id:
//!         description: Primary key
//! lineage:
//!   - source: hive.raw.order_events
//!     target: hive.sales.orders
//!     transformation_type: aggregation
//! glossary:
//!   - name: order
//!     description: A customer purchase
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::traits::{MetadataError, MetadataProvider, MetadataResult};
use crate::logging::Logger;
use crate::types::{
    now_unix, CancellationToken, ColumnContext, ColumnIdentifier, Deprecation, GlossaryTerm,
    LineageDirection, LineageEdge, LineageInfo, Owner, SearchFilter, TableContext,
    TableIdentifier, TableSearchResult, Tag,
};

#[derive(Debug, Deserialize, Default)]
struct MetadataFile {
    #[serde(default)]
    tables: Vec<TableEntry>,
    #[serde(default)]
    lineage: Vec<LineageEntry>,
    #[serde(default)]
    glossary: Vec<GlossaryEntry>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    catalog: String,
    schema: String,
    table: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    owners: Vec<Owner>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    glossary_terms: Vec<String>,
    #[serde(default)]
    deprecation: Option<Deprecation>,
    #[serde(default)]
    properties: HashMap<String, Value>,
    #[serde(default)]
    columns: HashMap<String, ColumnEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct ColumnEntry {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    glossary_terms: Vec<String>,
    #[serde(default)]
    deprecation: Option<Deprecation>,
    #[serde(default)]
    properties: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LineageEntry {
    source: String,
    target: String,
    #[serde(default)]
    column_mappings: Option<HashMap<String, String>>,
    #[serde(default)]
    transformation_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlossaryEntry {
    name: String,
    description: String,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    owners: Vec<Owner>,
}

struct Index {
    tables: HashMap<String, TableContext>,
    /// sorted table keys, for deterministic search order
    table_order: Vec<String>,
    columns: HashMap<String, HashMap<String, ColumnContext>>,
    glossary: HashMap<String, GlossaryTerm>,
    edges: Vec<LineageEdge>,
}

/// Static metadata provider reading one YAML document.
pub struct FileProvider {
    path: PathBuf,
    name: String,
    index: RwLock<Arc<Index>>,
    reload_task: Mutex<Option<JoinHandle<()>>>,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for FileProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProvider")
            .field("path", &self.path)
            .field("name", &self.name)
            .finish()
    }
}

impl FileProvider {
    /// Load the file eagerly; a malformed document is a configuration error
    /// surfaced now, not at first lookup.
    pub fn load(path: impl AsRef<Path>, logger: Arc<dyn Logger>) -> MetadataResult<Self> {
        let path = path.as_ref().to_path_buf();
        let name = match path.file_name() {
            Some(f) => format!("file:{}", f.to_string_lossy()),
            None => "file".to_string(),
        };
        let index = Self::read_index(&path, &name)?;
        Ok(Self {
            path,
            name,
            index: RwLock::new(Arc::new(index)),
            reload_task: Mutex::new(None),
            logger,
        })
    }

    fn read_index(path: &Path, source: &str) -> MetadataResult<Index> {
        let content = std::fs::read_to_string(path)?;
        let doc: MetadataFile = serde_yaml::from_str(&content)?;
        let fetched_at = now_unix();

        let mut tables = HashMap::new();
        let mut columns: HashMap<String, HashMap<String, ColumnContext>> = HashMap::new();
        for entry in doc.tables {
            let id = TableIdentifier::new(entry.catalog, entry.schema, entry.table);
            let key = id.key();

            let mut column_map = HashMap::new();
            for (column_name, col) in entry.columns {
                column_map.insert(
                    column_name.clone(),
                    ColumnContext {
                        column: ColumnIdentifier::new(id.clone(), column_name),
                        description: col.description,
                        tags: col.tags,
                        glossary_terms: col.glossary_terms,
                        deprecation: col.deprecation,
                        custom_properties: col.properties,
                        source: source.to_string(),
                        fetched_at,
                    },
                );
            }
            if !column_map.is_empty() {
                columns.insert(key.clone(), column_map);
            }

            tables.insert(
                key,
                TableContext {
                    table: id,
                    description: entry.description,
                    owners: entry.owners,
                    tags: entry.tags,
                    glossary_terms: entry.glossary_terms,
                    domain: entry.domain,
                    deprecation: entry.deprecation,
                    custom_properties: entry.properties,
                    source: source.to_string(),
                    fetched_at,
                },
            );
        }

        let mut edges = Vec::new();
        for entry in doc.lineage {
            let source_table = TableIdentifier::parse(&entry.source).ok_or_else(|| {
                MetadataError::Other(format!("invalid lineage source table: {}", entry.source))
            })?;
            let target_table = TableIdentifier::parse(&entry.target).ok_or_else(|| {
                MetadataError::Other(format!("invalid lineage target table: {}", entry.target))
            })?;
            edges.push(LineageEdge {
                source_table,
                target_table,
                column_mappings: entry.column_mappings,
                transformation_type: entry.transformation_type,
            });
        }

        let mut glossary = HashMap::new();
        for entry in doc.glossary {
            glossary.insert(
                entry.name.clone(),
                GlossaryTerm {
                    name: entry.name,
                    description: entry.description,
                    synonyms: entry.synonyms,
                    owners: entry.owners,
                    source: source.to_string(),
                },
            );
        }

        let mut table_order: Vec<String> = tables.keys().cloned().collect();
        table_order.sort();

        Ok(Index {
            tables,
            table_order,
            columns,
            glossary,
            edges,
        })
    }

    /// Re-read the file and swap the index. Lookups in flight keep the old
    /// snapshot.
    pub fn reload(&self) -> MetadataResult<()> {
        let index = Self::read_index(&self.path, &self.name)?;
        *self.index.write() = Arc::new(index);
        self.logger
            .debug(&format!("{} reloaded from {}", self.name, self.path.display()));
        Ok(())
    }

    /// Spawn a periodic reload task. Must be called from within a tokio
    /// runtime; replaces any previous task.
    pub fn spawn_reload(self: Arc<Self>, interval: Duration) {
        let provider = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if let Err(e) = provider.reload() {
                    provider
                        .logger
                        .warn(&format!("{} reload failed: {}", provider.name, e));
                }
            }
        });
        let mut slot = self.reload_task.lock();
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn snapshot(&self) -> Arc<Index> {
        self.index.read().clone()
    }

    /// Metadata in the file is connection-agnostic; lookups ignore the
    /// request's connection scope.
    fn index_key(table: &TableIdentifier) -> String {
        table.base_key()
    }

    fn matches(filter: &SearchFilter, ctx: &TableContext) -> bool {
        if !filter.include_deprecated && ctx.is_deprecated() {
            return false;
        }
        if let Some(catalog) = &filter.catalog {
            if &ctx.table.catalog != catalog {
                return false;
            }
        }
        if let Some(schema) = &filter.schema {
            if &ctx.table.schema != schema {
                return false;
            }
        }
        if let Some(domain) = &filter.domain {
            let matched = ctx
                .domain
                .as_ref()
                .is_some_and(|d| d.eq_ignore_ascii_case(domain));
            if !matched {
                return false;
            }
        }
        if let Some(owner) = &filter.owner {
            let matched = ctx.owners.iter().any(|o| &o.id == owner || &o.name == owner);
            if !matched {
                return false;
            }
        }
        for tag in &filter.tags {
            if !ctx.tags.iter().any(|t| &t.name == tag) {
                return false;
            }
        }
        if let Some(query) = &filter.query {
            let query = query.to_lowercase();
            if query.is_empty() {
                return true;
            }
            let name_hit = ctx.table.table.to_lowercase().contains(&query)
                || ctx.table.base_key().to_lowercase().contains(&query);
            let description_hit = ctx
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&query));
            if !name_hit && !description_hit {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl MetadataProvider for FileProvider {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn table_context(
        &self,
        _cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<TableContext>> {
        Ok(self.snapshot().tables.get(&Self::index_key(table)).cloned())
    }

    async fn column_context(
        &self,
        _cancel: &CancellationToken,
        column: &ColumnIdentifier,
    ) -> MetadataResult<Option<ColumnContext>> {
        let index = self.snapshot();
        Ok(index
            .columns
            .get(&Self::index_key(&column.table))
            .and_then(|cols| cols.get(&column.column))
            .cloned())
    }

    async fn columns_context(
        &self,
        _cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<HashMap<String, ColumnContext>>> {
        Ok(self.snapshot().columns.get(&Self::index_key(table)).cloned())
    }

    async fn lineage(
        &self,
        _cancel: &CancellationToken,
        table: &TableIdentifier,
        direction: LineageDirection,
        max_depth: u32,
    ) -> MetadataResult<Option<LineageInfo>> {
        let index = self.snapshot();

        // Breadth-first walk over the edge list, one hop per round.
        let mut frontier: HashSet<String> = HashSet::new();
        frontier.insert(Self::index_key(table));
        let mut collected: Vec<LineageEdge> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut depth = 0u32;

        while !frontier.is_empty() {
            depth += 1;
            if max_depth > 0 && depth > max_depth {
                break;
            }
            let mut next = HashSet::new();
            for edge in &index.edges {
                let (anchor, continues_to) = match direction {
                    LineageDirection::Upstream => {
                        (edge.target_table.base_key(), edge.source_table.base_key())
                    }
                    LineageDirection::Downstream => {
                        (edge.source_table.base_key(), edge.target_table.base_key())
                    }
                };
                if !frontier.contains(&anchor) {
                    continue;
                }
                let pair = (edge.source_table.base_key(), edge.target_table.base_key());
                if seen.insert(pair) {
                    collected.push(edge.clone());
                    next.insert(continues_to);
                }
            }
            frontier = next;
        }

        if collected.is_empty() {
            return Ok(None);
        }
        Ok(Some(LineageInfo {
            table: table.clone(),
            direction,
            edges: collected,
        }))
    }

    async fn glossary_term(
        &self,
        _cancel: &CancellationToken,
        term: &str,
    ) -> MetadataResult<Option<GlossaryTerm>> {
        Ok(self.snapshot().glossary.get(term).cloned())
    }

    async fn search_tables(
        &self,
        _cancel: &CancellationToken,
        filter: &SearchFilter,
    ) -> MetadataResult<Vec<TableSearchResult>> {
        let index = self.snapshot();
        let mut results = Vec::new();
        for key in &index.table_order {
            let Some(ctx) = index.tables.get(key) else {
                continue;
            };
            if !Self::matches(filter, ctx) {
                continue;
            }
            results.push(TableSearchResult {
                table: ctx.table.clone(),
                description: ctx.description.clone(),
                tags: ctx.tags.iter().map(|t| t.name.clone()).collect(),
                domain: ctx.domain.clone(),
                deprecated: ctx.is_deprecated(),
                source: self.name.clone(),
            });
            if filter.limit > 0 && results.len() >= filter.limit {
                break;
            }
        }
        Ok(results)
    }

    async fn close(&self) -> MetadataResult<()> {
        if let Some(handle) = self.reload_task.lock().take() {
            handle.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::logging::NoOpLogger;

    const SAMPLE: &str = r#"
tables:
  - catalog: hive
    schema: sales
    table: orders
    description: All customer orders
    domain: commerce
    owners:
      - { id: u1, name: alice, type: user, role: steward }
    tags:
      - { name: pii }
      - { name: core }
    glossary_terms: [order]
    properties:
      retention: 90d
    columns:
      order_id:
        description: Primary key
      customer_id:
        description: Buyer
        tags:
          - { name: pii }
  - catalog: hive
    schema: sales
    table: legacy_orders
    description: Old orders table
    deprecation:
      deprecated: true
      note: use orders
  - catalog: hive
    schema: raw
    table: order_events
    description: Raw order event stream
lineage:
  - source: hive.raw.order_events
    target: hive.sales.orders
    transformation_type: aggregation
  - source: hive.landing.order_files
    target: hive.raw.order_events
glossary:
  - name: order
    description: A customer purchase
    synonyms: [purchase]
"#;

    fn sample_provider() -> (tempfile::TempDir, FileProvider) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let provider = FileProvider::load(&path, Arc::new(NoOpLogger)).unwrap();
        (dir, provider)
    }

    fn cancel() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn test_table_context_lookup() {
        let (_dir, provider) = sample_provider();
        let table = TableIdentifier::new("hive", "sales", "orders");

        let ctx = provider.table_context(&cancel(), &table).await.unwrap().unwrap();
        assert_eq!(ctx.description.as_deref(), Some("All customer orders"));
        assert_eq!(ctx.domain.as_deref(), Some("commerce"));
        assert_eq!(ctx.owners.len(), 1);
        assert_eq!(ctx.custom_properties["retention"], "90d");

        let missing = TableIdentifier::new("hive", "sales", "nope");
        assert!(provider.table_context(&cancel(), &missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connection_scope_is_ignored() {
        let (_dir, provider) = sample_provider();
        let table = TableIdentifier::new("hive", "sales", "orders").with_connection("eu");
        assert!(provider.table_context(&cancel(), &table).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_column_lookups() {
        let (_dir, provider) = sample_provider();
        let table = TableIdentifier::new("hive", "sales", "orders");

        let col = provider
            .column_context(&cancel(), &table.column("order_id"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(col.description.as_deref(), Some("Primary key"));

        let all = provider.columns_context(&cancel(), &table).await.unwrap().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("customer_id"));

        let bare = TableIdentifier::new("hive", "raw", "order_events");
        assert!(provider.columns_context(&cancel(), &bare).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lineage_depth_limits() {
        let (_dir, provider) = sample_provider();
        let table = TableIdentifier::new("hive", "sales", "orders");

        let one_hop = provider
            .lineage(&cancel(), &table, LineageDirection::Upstream, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(one_hop.edges.len(), 1);
        assert_eq!(one_hop.edges[0].source_table.base_key(), "hive.raw.order_events");

        let unlimited = provider
            .lineage(&cancel(), &table, LineageDirection::Upstream, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unlimited.edges.len(), 2);
    }

    #[tokio::test]
    async fn test_lineage_downstream_and_absent() {
        let (_dir, provider) = sample_provider();

        let events = TableIdentifier::new("hive", "raw", "order_events");
        let down = provider
            .lineage(&cancel(), &events, LineageDirection::Downstream, 0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(down.edges.len(), 1);
        assert_eq!(down.edges[0].target_table.base_key(), "hive.sales.orders");

        let isolated = TableIdentifier::new("hive", "sales", "legacy_orders");
        assert!(provider
            .lineage(&cancel(), &isolated, LineageDirection::Upstream, 0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_glossary_lookup() {
        let (_dir, provider) = sample_provider();
        let term = provider.glossary_term(&cancel(), "order").await.unwrap().unwrap();
        assert_eq!(term.synonyms, vec!["purchase"]);
        assert!(provider.glossary_term(&cancel(), "unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_query_and_filters() {
        let (_dir, provider) = sample_provider();

        let by_query = provider
            .search_tables(&cancel(), &SearchFilter::all().with_query("orders"))
            .await
            .unwrap();
        // legacy_orders is deprecated and filtered out by default
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].table.table, "orders");

        let with_deprecated = provider
            .search_tables(
                &cancel(),
                &SearchFilter {
                    query: Some("orders".to_string()),
                    include_deprecated: true,
                    ..SearchFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(with_deprecated.len(), 2);

        let by_tag = provider
            .search_tables(&cancel(), &SearchFilter::all().with_tag("pii"))
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);

        let by_owner = provider
            .search_tables(
                &cancel(),
                &SearchFilter {
                    owner: Some("alice".to_string()),
                    ..SearchFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_owner.len(), 1);

        let nothing = provider
            .search_tables(&cancel(), &SearchFilter::all().with_query("zzz"))
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_search_limit() {
        let (_dir, provider) = sample_provider();
        let limited = provider
            .search_tables(&cancel(), &SearchFilter::all().with_limit(1))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let provider = FileProvider::load(&path, Arc::new(NoOpLogger)).unwrap();

        let table = TableIdentifier::new("hive", "sales", "fresh");
        assert!(provider.table_context(&cancel(), &table).await.unwrap().is_none());

        std::fs::write(
            &path,
            "tables:\n  - catalog: hive\n    schema: sales\n    table: fresh\n    description: Just added\n",
        )
        .unwrap();
        provider.reload().unwrap();

        assert!(provider.table_context(&cancel(), &table).await.unwrap().is_some());
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.yaml");
        std::fs::write(&path, "tables: {not: [a, list}").unwrap();
        assert!(FileProvider::load(&path, Arc::new(NoOpLogger)).is_err());
    }

    #[test]
    fn test_invalid_lineage_reference_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.yaml");
        std::fs::write(&path, "lineage:\n  - source: not-dotted\n    target: hive.sales.orders\n")
            .unwrap();
        let err = FileProvider::load(&path, Arc::new(NoOpLogger)).unwrap_err();
        assert!(err.to_string().contains("not-dotted"));
    }
}
