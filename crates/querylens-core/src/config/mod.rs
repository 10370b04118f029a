//! Server configuration (YAML file + environment overrides)
//!
//! Configuration problems are reported as descriptive [`ConfigError`]s at
//! startup; they never crash the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineError;
use crate::logging::Logger;
use crate::metadata::{
    self, BackendSettings, CacheConfig, CachingProvider, MetadataError, MetadataProvider,
    NoopProvider, ProviderChain,
};

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// One engine connection as written in the config file. Optional fields on
/// additional connections inherit from the primary; see
/// [`crate::connection::ConnectionManager`] for the exact rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub ssl: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Cache layer settings. Zero values mean "use the built-in default".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub ttl_seconds: u64,
    #[serde(default)]
    pub max_entries: usize,
    #[serde(default)]
    pub cache_errors: bool,
    #[serde(default)]
    pub error_ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 0,
            max_entries: 0,
            cache_errors: false,
            error_ttl_seconds: 0,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.ttl_seconds),
            max_entries: self.max_entries,
            cache_errors: self.cache_errors,
            error_ttl: Duration::from_secs(self.error_ttl_seconds),
        }
    }
}

/// Metadata backend stack. Backends are chained in listed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataSettings {
    #[serde(default)]
    pub backends: Vec<BackendSettings>,
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The primary engine connection
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Named additional connections
    #[serde(default)]
    pub additional_connections: HashMap<String, ConnectionConfig>,
    /// Which connection an unnamed request resolves to; the primary when
    /// unset
    #[serde(default)]
    pub default_connection: Option<String>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub metadata: MetadataSettings,
}

impl ServerConfig {
    /// Read a config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ServerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Default config location: `<config dir>/querylens/config.yaml`.
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("querylens").join("config.yaml")
    }

    /// Load from `QUERYLENS_CONFIG` (or the default path when unset), then
    /// apply environment overrides for the primary connection.
    pub fn from_env() -> ConfigResult<Self> {
        let path = std::env::var("QUERYLENS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables win over the config file for the primary
    /// connection.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("QUERYLENS_HOST") {
            self.connection.host = host;
        }
        if let Ok(port) = std::env::var("QUERYLENS_PORT") {
            if let Ok(port) = port.parse() {
                self.connection.port = Some(port);
            }
        }
        if let Ok(user) = std::env::var("QUERYLENS_USER") {
            self.connection.user = Some(user);
        }
        if let Ok(password) = std::env::var("QUERYLENS_PASSWORD") {
            self.connection.password = Some(password);
        }
        if let Ok(catalog) = std::env::var("QUERYLENS_CATALOG") {
            self.connection.catalog = Some(catalog);
        }
        if let Ok(schema) = std::env::var("QUERYLENS_SCHEMA") {
            self.connection.schema = Some(schema);
        }
        if let Ok(ssl) = std::env::var("QUERYLENS_SSL") {
            self.connection.ssl = Some(ssl == "1" || ssl.eq_ignore_ascii_case("true"));
        }
    }

    /// Startup validation: every problem reported here keeps its
    /// user-actionable message.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "primary connection host is not set (config file or QUERYLENS_HOST)".to_string(),
            ));
        }
        for name in self.additional_connections.keys() {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "additional connection with empty name".to_string(),
                ));
            }
            if name == crate::connection::PRIMARY_CONNECTION {
                return Err(ConfigError::Invalid(format!(
                    "additional connection name {} is reserved for the primary",
                    name
                )));
            }
        }
        if let Some(default) = &self.default_connection {
            let known = default == crate::connection::PRIMARY_CONNECTION
                || self.additional_connections.contains_key(default);
            if !known {
                let mut names: Vec<String> =
                    self.additional_connections.keys().cloned().collect();
                names.push(crate::connection::PRIMARY_CONNECTION.to_string());
                names.sort();
                return Err(ConfigError::Invalid(format!(
                    "default connection {} is not configured (known connections: {})",
                    default,
                    names.join(", ")
                )));
            }
        }
        for backend in &self.metadata.backends {
            if !metadata::has_provider_backend(&backend.kind) {
                let kinds: Vec<String> = metadata::list_provider_backends()
                    .into_iter()
                    .map(|(kind, _)| kind)
                    .collect();
                return Err(ConfigError::Invalid(format!(
                    "unknown metadata backend kind: {} (registered kinds: {})",
                    backend.kind,
                    kinds.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Assemble the metadata provider stack: configured backends chained in
    /// order, wrapped in the cache layer when enabled. No backends means the
    /// no-op provider, uncached.
    pub fn build_metadata_provider(
        &self,
        logger: &Arc<dyn Logger>,
    ) -> ConfigResult<Arc<dyn MetadataProvider>> {
        let mut providers = Vec::new();
        for backend in &self.metadata.backends {
            providers.push(metadata::create_provider(backend, logger)?);
        }

        if providers.is_empty() {
            return Ok(Arc::new(NoopProvider));
        }
        let base: Arc<dyn MetadataProvider> = if providers.len() == 1 {
            providers.remove(0)
        } else {
            Arc::new(ProviderChain::new(providers))
        };

        if self.cache.enabled {
            Ok(Arc::new(CachingProvider::with_config(
                base,
                self.cache.to_cache_config(),
            )))
        } else {
            Ok(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
connection:
  host: trino.internal
  port: 8443
  user: svc_querylens
  password: hunter2
  catalog: hive
  schema: default
  ssl: true
additional_connections:
  eu:
    host: trino-eu.internal
  staging:
    host: trino-staging.internal
    user: svc_staging
    ssl: false
default_connection: eu
cache:
  ttl_seconds: 120
  max_entries: 500
  cache_errors: true
  error_ttl_seconds: 30
metadata:
  backends:
    - kind: file
      path: /etc/querylens/metadata.yaml
      reload_seconds: 300
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.connection.host, "trino.internal");
        assert_eq!(config.connection.port, Some(8443));
        assert_eq!(config.additional_connections.len(), 2);
        assert!(config.additional_connections["eu"].user.is_none());
        assert_eq!(config.default_connection.as_deref(), Some("eu"));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 120);
        assert_eq!(config.metadata.backends.len(), 1);
        assert_eq!(config.metadata.backends[0].kind, "file");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_host_fails_validation() {
        let config = ServerConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_unknown_default_connection_fails_validation() {
        let yaml = "connection:\n  host: trino.internal\ndefault_connection: nope\n";
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nope"));
        assert!(err.to_string().contains("primary"));
    }

    #[test]
    fn test_unknown_backend_kind_fails_validation() {
        let yaml = r#"
connection:
  host: trino.internal
metadata:
  backends:
    - kind: warp_drive
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("warp_drive"));
        assert!(err.to_string().contains("file"));
    }

    #[test]
    fn test_cache_settings_zero_values_use_defaults() {
        let settings = CacheSettings::default();
        assert!(settings.enabled);
        // zero seconds normalize inside the cache layer
        assert_eq!(settings.to_cache_config().ttl, Duration::ZERO);
    }

    #[test]
    fn test_build_provider_without_backends_is_noop() {
        let config = ServerConfig::default();
        let provider = config.build_metadata_provider(&logger()).unwrap();
        assert_eq!(provider.name(), "noop");
    }

    #[test]
    fn test_build_provider_with_file_backend_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.yaml");
        std::fs::write(&path, "tables: []\n").unwrap();

        let mut config = ServerConfig::default();
        config.metadata.backends.push(BackendSettings {
            kind: "file".to_string(),
            path: Some(path),
            reload_seconds: None,
        });

        let provider = config.build_metadata_provider(&logger()).unwrap();
        assert_eq!(provider.name(), "cached(file:metadata.yaml)");
    }

    #[test]
    fn test_build_provider_chains_multiple_backends() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.yaml");
        let b = dir.path().join("b.yaml");
        std::fs::write(&a, "tables: []\n").unwrap();
        std::fs::write(&b, "tables: []\n").unwrap();

        let mut config = ServerConfig::default();
        config.cache.enabled = false;
        for path in [a, b] {
            config.metadata.backends.push(BackendSettings {
                kind: "file".to_string(),
                path: Some(path),
                reload_seconds: None,
            });
        }

        let provider = config.build_metadata_provider(&logger()).unwrap();
        assert_eq!(provider.name(), "chain(file:a.yaml,file:b.yaml)");
    }
}
