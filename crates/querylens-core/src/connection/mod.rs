//! Connection resolution: logical connection names to live engine clients
//!
//! The manager is built once from validated configuration and is read-only
//! afterwards, so lookups from concurrent tool calls never block each
//! other.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{ConfigError, ConnectionConfig, ServerConfig};
use crate::engine::{Client, EngineError, EngineResult, HttpClient, HttpClientConfig};

/// Name of the primary connection.
pub const PRIMARY_CONNECTION: &str = "primary";

const DEFAULT_USER: &str = "querylens";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SSL_PORT: u16 = 443;

/// Read-only snapshot describing one configured connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub name: String,
    pub host: String,
    pub is_default: bool,
}

/// A connection config with inheritance and defaults applied.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub ssl: bool,
}

impl ResolvedConnection {
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            ssl: self.ssl,
        }
    }
}

/// A string field inherits when it is absent OR empty. The config format
/// cannot distinguish "intentionally empty" from "never set"; both inherit,
/// and that ambiguity is kept on purpose rather than silently changed.
fn inherit_field(value: &Option<String>, primary: &Option<String>) -> Option<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => primary.clone(),
    }
}

/// Apply inheritance from the primary and fill defaults. `user`, `password`,
/// `catalog`, `schema` and `ssl` inherit; `host` and `port` do not.
fn resolve_connection(
    name: &str,
    config: &ConnectionConfig,
    primary: &ConnectionConfig,
) -> Result<ResolvedConnection, ConfigError> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "connection {}: host is required",
            name
        )));
    }
    let ssl = config.ssl.or(primary.ssl).unwrap_or(false);
    let port = config
        .port
        .unwrap_or(if ssl { DEFAULT_SSL_PORT } else { DEFAULT_PORT });
    let user = inherit_field(&config.user, &primary.user)
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    Ok(ResolvedConnection {
        name: name.to_string(),
        host: config.host.clone(),
        port,
        user,
        password: inherit_field(&config.password, &primary.password),
        catalog: inherit_field(&config.catalog, &primary.catalog),
        schema: inherit_field(&config.schema, &primary.schema),
        ssl,
    })
}

/// Routes logical connection names to engine clients.
pub struct ConnectionManager {
    clients: HashMap<String, Arc<dyn Client>>,
    infos: Vec<ConnectionInfo>,
    default_name: String,
    /// Set when construction from configuration failed; every lookup then
    /// fails with this message instead of "connection not found".
    unconfigured: Option<String>,
}

impl ConnectionManager {
    /// Build the manager from configuration, creating one client per
    /// connection via `factory`. Construction is a setup-phase operation and
    /// assumed single-threaded.
    pub fn from_config<F>(config: &ServerConfig, factory: F) -> Result<Self, ConfigError>
    where
        F: Fn(&ResolvedConnection) -> EngineResult<Arc<dyn Client>>,
    {
        config.validate()?;

        let mut clients = HashMap::new();
        let mut resolved_all = Vec::new();

        let primary = resolve_connection(PRIMARY_CONNECTION, &config.connection, &config.connection)?;
        clients.insert(primary.name.clone(), factory(&primary)?);
        resolved_all.push(primary);

        let mut names: Vec<&String> = config.additional_connections.keys().collect();
        names.sort();
        for name in names {
            let resolved =
                resolve_connection(name, &config.additional_connections[name], &config.connection)?;
            clients.insert(resolved.name.clone(), factory(&resolved)?);
            resolved_all.push(resolved);
        }

        let default_name = config
            .default_connection
            .clone()
            .unwrap_or_else(|| PRIMARY_CONNECTION.to_string());

        let infos = resolved_all
            .iter()
            .map(|r| ConnectionInfo {
                name: r.name.clone(),
                host: r.host.clone(),
                is_default: r.name == default_name,
            })
            .collect();

        Ok(Self {
            clients,
            infos,
            default_name,
            unconfigured: None,
        })
    }

    /// Manager for a server whose connection configuration failed
    /// validation. The process keeps serving; every client lookup fails
    /// with the configuration error until the operator fixes it.
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            clients: HashMap::new(),
            infos: Vec::new(),
            default_name: PRIMARY_CONNECTION.to_string(),
            unconfigured: Some(reason.into()),
        }
    }

    /// Build with HTTP engine clients.
    pub fn http(config: &ServerConfig) -> Result<Self, ConfigError> {
        Self::from_config(config, |resolved| {
            Ok(Arc::new(HttpClient::new(resolved.http_config())?) as Arc<dyn Client>)
        })
    }

    /// Resolve a logical name to its client. The empty name means the
    /// default connection.
    pub fn client(&self, name: &str) -> EngineResult<Arc<dyn Client>> {
        if let Some(reason) = &self.unconfigured {
            return Err(EngineError::NotConfigured(reason.clone()));
        }
        let effective = if name.is_empty() {
            self.default_name.as_str()
        } else {
            name
        };
        match self.clients.get(effective) {
            Some(client) => Ok(client.clone()),
            None => {
                let mut known: Vec<String> = self.clients.keys().cloned().collect();
                known.sort();
                Err(EngineError::UnknownConnection {
                    name: effective.to_string(),
                    known,
                })
            }
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Snapshot of every configured connection: primary first, additional
    /// connections in name order. Never opens new connections.
    pub fn connection_infos(&self) -> Vec<ConnectionInfo> {
        self.infos.clone()
    }

    /// Close every held client exactly once; the first error is reported
    /// after all clients have been closed.
    pub async fn close(&self) -> EngineResult<()> {
        let mut first_err = None;
        for info in &self.infos {
            if let Some(client) = self.clients.get(&info.name) {
                if let Err(e) = client.close().await {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
