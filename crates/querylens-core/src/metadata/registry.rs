//! Metadata backend registry for creating providers by kind

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::file::FileProvider;
use super::noop::NoopProvider;
use super::traits::{MetadataError, MetadataProvider, MetadataResult};
use crate::logging::Logger;

/// Configuration for one metadata backend, as it appears in the server
/// config. Backends beyond the built-in kinds read their settings from the
/// same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Registered backend kind, e.g. `file`
    pub kind: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Reload the backend this often; absent or 0 disables reloading
    #[serde(default)]
    pub reload_seconds: Option<u64>,
}

/// Factory function type for creating metadata providers
pub type BackendFactory = Box<
    dyn Fn(&BackendSettings, &Arc<dyn Logger>) -> MetadataResult<Arc<dyn MetadataProvider>>
        + Send
        + Sync,
>;

struct BackendDefinition {
    description: String,
    factory: BackendFactory,
}

static REGISTRY: Lazy<RwLock<HashMap<String, BackendDefinition>>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert(
        "noop".to_string(),
        BackendDefinition {
            description: "No metadata; every lookup is absent".to_string(),
            factory: Box::new(|_, _| Ok(Arc::new(NoopProvider) as Arc<dyn MetadataProvider>)),
        },
    );

    map.insert(
        "file".to_string(),
        BackendDefinition {
            description: "Static metadata from a YAML file".to_string(),
            factory: Box::new(|settings, logger| {
                let path = settings.path.as_ref().ok_or_else(|| {
                    MetadataError::Other("file metadata backend requires a path".to_string())
                })?;
                let provider = Arc::new(FileProvider::load(path, logger.clone())?);
                if let Some(seconds) = settings.reload_seconds {
                    if seconds > 0 {
                        provider.clone().spawn_reload(Duration::from_secs(seconds));
                    }
                }
                Ok(provider as Arc<dyn MetadataProvider>)
            }),
        },
    );

    RwLock::new(map)
});

/// Register a new backend kind. Re-registering a kind replaces its factory.
pub fn register_provider_backend(kind: &str, description: &str, factory: BackendFactory) {
    let mut registry = REGISTRY.write().unwrap();
    registry.insert(
        kind.to_string(),
        BackendDefinition {
            description: description.to_string(),
            factory,
        },
    );
}

/// Create a provider from backend settings. Unknown kinds are an error that
/// lists what is registered.
pub fn create_provider(
    settings: &BackendSettings,
    logger: &Arc<dyn Logger>,
) -> MetadataResult<Arc<dyn MetadataProvider>> {
    let registry = REGISTRY.read().unwrap();
    match registry.get(&settings.kind) {
        Some(def) => (def.factory)(settings, logger),
        None => {
            let mut known: Vec<String> = registry.keys().cloned().collect();
            known.sort();
            Err(MetadataError::Other(format!(
                "unknown metadata backend kind: {} (registered kinds: {})",
                settings.kind,
                known.join(", ")
            )))
        }
    }
}

/// List registered backend kinds as (kind, description) pairs.
pub fn list_provider_backends() -> Vec<(String, String)> {
    let registry = REGISTRY.read().unwrap();
    let mut backends: Vec<(String, String)> = registry
        .iter()
        .map(|(kind, def)| (kind.clone(), def.description.clone()))
        .collect();
    backends.sort();
    backends
}

pub fn has_provider_backend(kind: &str) -> bool {
    REGISTRY.read().unwrap().contains_key(kind)
}
