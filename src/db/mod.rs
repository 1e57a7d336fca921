//! Database abstraction layer for query-batch.
//!
//! Provides a trait-based interface over the relational engine so the runner
//! can be driven by the SQLite client in production and by a scripted mock
//! in tests.

mod mock;
mod sqlite;
mod types;

pub use mock::{MockDatabaseClient, MockProbe};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, ResultTable, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Opens the database file at `path` and returns an exclusively owned handle.
///
/// The file must already exist; it is opened read-only.
pub async fn open(path: &Path) -> Result<Box<dyn DatabaseClient>> {
    let client = SqliteClient::open(path).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// Query failures are returned as unattributed `BatchError::Query` values;
/// the caller knows which label the SQL belongs to.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the materialized result table.
    async fn execute_query(&self, sql: &str) -> Result<ResultTable>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
