//! HTTP engine client for the REST statement protocol
//!
//! Speaks the `/v1/statement` protocol used by Trino-style engines: POST
//! the SQL text, then follow `nextUri` pages until the result is complete.
//! Cancellation is checked between pages, which is the natural protocol
//! boundary.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::traits::{
    Client, ColumnInfo, EngineError, EngineResult, QueryOptions, QueryResult, TableSchema,
};
use crate::types::{CancellationToken, TableIdentifier};

const SOURCE_NAME: &str = "querylens";

/// Connection parameters for one engine endpoint.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Default catalog for unqualified table names
    pub catalog: Option<String>,
    /// Default schema for unqualified table names
    pub schema: Option<String>,
    pub ssl: bool,
}

impl HttpClientConfig {
    fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    next_uri: Option<String>,
    #[serde(default)]
    columns: Option<Vec<StatementColumn>>,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    error: Option<StatementError>,
}

#[derive(Debug, Deserialize)]
struct StatementColumn {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Engine client over HTTP(S).
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> EngineResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        let base_url = config.base_url();
        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.password {
            Some(password) => request.basic_auth(&self.config.user, Some(password)),
            None => request,
        }
    }

    async fn fetch_page(&self, uri: &str) -> EngineResult<StatementResponse> {
        let request = self
            .with_auth(self.http.get(uri))
            .header("X-Trino-User", &self.config.user);
        let page = request
            .send()
            .await?
            .error_for_status()?
            .json::<StatementResponse>()
            .await?;
        Ok(page)
    }

    async fn run_statement(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        options: &QueryOptions,
    ) -> EngineResult<QueryResult> {
        let mut request = self
            .with_auth(self.http.post(format!("{}/v1/statement", self.base_url)))
            .header("X-Trino-User", &self.config.user)
            .header("X-Trino-Source", SOURCE_NAME);
        if let Some(catalog) = &self.config.catalog {
            request = request.header("X-Trino-Catalog", catalog);
        }
        if let Some(schema) = &self.config.schema {
            request = request.header("X-Trino-Schema", schema);
        }

        let mut page = request
            .body(sql.to_string())
            .send()
            .await?
            .error_for_status()?
            .json::<StatementResponse>()
            .await?;

        let mut result = QueryResult::default();
        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if let Some(error) = page.error.take() {
                return Err(EngineError::query_failed(
                    error.error_code,
                    error
                        .message
                        .unwrap_or_else(|| "unknown engine error".to_string()),
                ));
            }
            if result.columns.is_empty() {
                if let Some(columns) = page.columns.take() {
                    result.columns = columns
                        .into_iter()
                        .map(|c| ColumnInfo {
                            name: c.name,
                            data_type: c.data_type,
                            comment: None,
                        })
                        .collect();
                }
            }
            if let Some(data) = page.data.take() {
                for row in data {
                    if let Some(max) = options.max_rows {
                        if result.rows.len() >= max {
                            result.truncated = true;
                            break;
                        }
                    }
                    result.rows.push(row);
                }
            }
            if result.truncated {
                break;
            }
            match page.next_uri.take() {
                Some(next) => {
                    page = tokio::select! {
                        response = self.fetch_page(&next) => response?,
                        _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                    };
                }
                None => break,
            }
        }
        Ok(result)
    }

    fn single_column_strings(result: &QueryResult) -> Vec<String> {
        result
            .rows
            .iter()
            .filter_map(|row| row.first())
            .map(value_to_string)
            .collect()
    }
}

#[async_trait]
impl Client for HttpClient {
    async fn query(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        options: &QueryOptions,
    ) -> EngineResult<QueryResult> {
        match options.timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.run_statement(cancel, sql, options)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Timeout(deadline)),
                }
            }
            None => self.run_statement(cancel, sql, options).await,
        }
    }

    async fn explain(&self, cancel: &CancellationToken, sql: &str) -> EngineResult<String> {
        let result = self
            .query(cancel, &format!("EXPLAIN {}", sql), &QueryOptions::default())
            .await?;
        Ok(Self::single_column_strings(&result).join("\n"))
    }

    async fn list_catalogs(&self, cancel: &CancellationToken) -> EngineResult<Vec<String>> {
        let result = self
            .query(cancel, "SHOW CATALOGS", &QueryOptions::default())
            .await?;
        Ok(Self::single_column_strings(&result))
    }

    async fn list_schemas(
        &self,
        cancel: &CancellationToken,
        catalog: &str,
    ) -> EngineResult<Vec<String>> {
        let sql = format!("SHOW SCHEMAS FROM {}", quote_ident(catalog));
        let result = self.query(cancel, &sql, &QueryOptions::default()).await?;
        Ok(Self::single_column_strings(&result))
    }

    async fn list_tables(
        &self,
        cancel: &CancellationToken,
        catalog: &str,
        schema: &str,
    ) -> EngineResult<Vec<String>> {
        let sql = format!(
            "SHOW TABLES FROM {}.{}",
            quote_ident(catalog),
            quote_ident(schema)
        );
        let result = self.query(cancel, &sql, &QueryOptions::default()).await?;
        Ok(Self::single_column_strings(&result))
    }

    async fn describe_table(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> EngineResult<TableSchema> {
        let sql = format!(
            "DESCRIBE {}.{}.{}",
            quote_ident(&table.catalog),
            quote_ident(&table.schema),
            quote_ident(&table.table)
        );
        let result = self.query(cancel, &sql, &QueryOptions::default()).await?;

        // DESCRIBE rows are [column, type, extra, comment]
        let columns = result
            .rows
            .iter()
            .map(|row| {
                let name = row
                    .first()
                    .map(value_to_string)
                    .ok_or_else(|| EngineError::invalid_response("DESCRIBE row missing name"))?;
                let data_type = row.get(1).map(value_to_string).unwrap_or_default();
                let comment = row
                    .get(3)
                    .map(value_to_string)
                    .filter(|c| !c.is_empty());
                Ok(ColumnInfo {
                    name,
                    data_type,
                    comment,
                })
            })
            .collect::<EngineResult<Vec<ColumnInfo>>>()?;

        Ok(TableSchema {
            table: table.clone(),
            columns,
        })
    }
}

/// Double-quote an identifier for SQL text, escaping embedded quotes.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
