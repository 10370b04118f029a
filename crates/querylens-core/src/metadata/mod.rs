//! Semantic metadata providers
//!
//! A [`MetadataProvider`] is the sole contract a metadata backend has to
//! satisfy. The decorators here compose over it without changing it:
//! [`CachingProvider`] adds a TTL-bounded memo layer, [`ProviderChain`]
//! composes an ordered fallback/merge list. Both implement the same trait,
//! so a cache-of-chain and a chain-of-caches are equally valid stacks.

mod cache;
mod chain;
mod delegate;
mod file;
mod noop;
mod registry;
mod traits;

pub use cache::{CacheConfig, CacheStats, CachingProvider};
pub use chain::ProviderChain;
pub use delegate::DelegatingProvider;
pub use file::FileProvider;
pub use noop::NoopProvider;
pub use registry::{
    create_provider, has_provider_backend, list_provider_backends, register_provider_backend,
    BackendFactory, BackendSettings,
};
pub use traits::{MetadataError, MetadataProvider, MetadataResult};
