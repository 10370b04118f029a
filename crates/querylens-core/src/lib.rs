//! Querylens Core
//!
//! Protocol-agnostic core of a tool server for Trino-style analytical
//! engines, enriched with organizational ("semantic") metadata: table and
//! column descriptions, ownership, tags, lineage and glossary terms.
//!
//! The interesting machinery is composition, not query execution:
//! - the `metadata` module defines the provider contract plus two
//!   decorators (a TTL cache and a fallback/merge chain) that stack over
//!   any backend;
//! - the `connection` module routes logical connection names to engine
//!   clients with credential inheritance;
//! - the `toolkit` module wraps every tool invocation in middleware,
//!   SQL interceptors and result transformers.
//!
//! ## Assembling a server
//!
//! ```rust,ignore
//! use querylens_core::config::ServerConfig;
//! use querylens_core::connection::ConnectionManager;
//! use querylens_core::toolkit::Toolkit;
//! use querylens_core::tools::{self, ToolDeps};
//!
//! let config = ServerConfig::from_env()?;
//! let connections = Arc::new(ConnectionManager::http(&config)?);
//! let metadata = config.build_metadata_provider(&logger)?;
//!
//! let toolkit = Toolkit::new(logger.clone());
//! let deps = Arc::new(ToolDeps { connections, metadata, interceptors: toolkit.interceptors(), logger });
//! tools::register_all(&toolkit, &deps);
//!
//! let response = toolkit.execute("execute_query", payload, None, cancel).await;
//! ```

pub mod config;
pub mod connection;
pub mod engine;
pub mod logging;
pub mod metadata;
pub mod toolkit;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    CancellationToken, ColumnContext, ColumnIdentifier, GlossaryTerm, LineageDirection,
    LineageEdge, LineageInfo, Owner, OwnerType, SearchFilter, TableContext, TableIdentifier,
    TableSearchResult, Tag,
};

pub use metadata::{
    CacheConfig, CacheStats, CachingProvider, DelegatingProvider, MetadataError, MetadataProvider,
    MetadataResult, NoopProvider, ProviderChain,
};

pub use engine::{Client, EngineError, EngineResult, HttpClient, QueryOptions, QueryResult};

pub use connection::{ConnectionInfo, ConnectionManager, PRIMARY_CONNECTION};

pub use config::{CacheSettings, ConfigError, ConnectionConfig, ServerConfig};

pub use logging::{ConsoleLogger, FileLogger, LogLevel, Logger, NoOpLogger};

pub use toolkit::{
    Middleware, ResultTransformer, SqlInterceptor, ToolContext, ToolError, ToolHandler,
    ToolResponse, ToolSpec, Toolkit,
};

pub use tools::{register_all, ToolDeps};
