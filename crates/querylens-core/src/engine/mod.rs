//! Query engine access
//!
//! [`Client`] is the only thing the rest of the crate knows about the
//! engine; [`HttpClient`] implements it over the REST statement protocol
//! spoken by Trino-style engines.

mod http;
mod traits;

pub use http::{HttpClient, HttpClientConfig};
pub use traits::{
    Client, ColumnInfo, EngineError, EngineResult, QueryOptions, QueryResult, TableSchema,
};
