//! Shared value types: identifiers, metadata snapshots, lineage, search

mod cancellation;
mod context;
mod glossary;
mod identifier;
mod lineage;
mod search;

pub use cancellation::CancellationToken;
pub use context::{ColumnContext, Deprecation, Owner, OwnerType, TableContext, Tag};
pub use glossary::GlossaryTerm;
pub use identifier::{ColumnIdentifier, TableIdentifier};
pub use lineage::{LineageDirection, LineageEdge, LineageInfo};
pub use search::{SearchFilter, TableSearchResult};

/// Current wall-clock time as seconds since the Unix epoch.
///
/// Metadata snapshots carry this as their fetch timestamp; it is never
/// used for cache keys.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
