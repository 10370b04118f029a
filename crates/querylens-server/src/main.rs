mod service;

use std::sync::Arc;

use rmcp::{transport::stdio, ServiceExt};

use querylens_core::config::{ConfigResult, ServerConfig};
use querylens_core::connection::ConnectionManager;
use querylens_core::logging::{ConsoleLogger, FileLogger, LogLevel, Logger};
use querylens_core::metadata::{MetadataProvider, NoopProvider};
use querylens_core::toolkit::{LoggingMiddleware, TimingMiddleware, Toolkit};
use querylens_core::tools::{self, ToolDeps};
use querylens_core::{log_error, log_info};

use service::QuerylensService;

fn build_logger() -> anyhow::Result<Arc<dyn Logger>> {
    // stdout carries the protocol; logs go to stderr or a file
    match std::env::var("QUERYLENS_LOG_FILE") {
        Ok(path) => {
            let level = LogLevel::parse(
                &std::env::var("QUERYLENS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            );
            Ok(Arc::new(FileLogger::create(path, level)?))
        }
        Err(_) => Ok(Arc::new(ConsoleLogger::new())),
    }
}

/// Assemble connections and metadata from configuration. A configuration
/// problem does not stop the server: it serves a degraded stack whose tool
/// calls fail with the configuration error until it is fixed.
fn build_stack(
    logger: &Arc<dyn Logger>,
) -> (Arc<ConnectionManager>, Arc<dyn MetadataProvider>) {
    let configured: ConfigResult<_> = ServerConfig::from_env().and_then(|config| {
        let connections = ConnectionManager::http(&config)?;
        let metadata = config.build_metadata_provider(logger)?;
        Ok((Arc::new(connections), metadata))
    });
    match configured {
        Ok(stack) => stack,
        Err(e) => {
            log_error!(
                logger,
                "configuration error: {}; serving degraded until reconfigured",
                e
            );
            (
                Arc::new(ConnectionManager::unconfigured(e.to_string())),
                Arc::new(NoopProvider),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = build_logger()?;
    let (connections, metadata) = build_stack(&logger);

    let toolkit = Arc::new(Toolkit::new(logger.clone()));
    toolkit.add_middleware(Arc::new(LoggingMiddleware::new(logger.clone())));
    toolkit.add_middleware(Arc::new(TimingMiddleware::new(logger.clone())));

    let deps = Arc::new(ToolDeps {
        connections: connections.clone(),
        metadata: metadata.clone(),
        interceptors: toolkit.interceptors(),
        logger: logger.clone(),
    });
    tools::register_all(&toolkit, &deps);

    log_info!(
        logger,
        "querylens serving {} tools over stdio (metadata: {})",
        toolkit.tool_count(),
        metadata.name()
    );

    let server = QuerylensService::new(toolkit).serve(stdio()).await?;
    server.waiting().await?;

    if let Err(e) = metadata.close().await {
        logger.warn(&format!("metadata shutdown: {}", e));
    }
    if let Err(e) = connections.close().await {
        logger.warn(&format!("connection shutdown: {}", e));
    }
    log_info!(logger, "querylens stopped");
    Ok(())
}
