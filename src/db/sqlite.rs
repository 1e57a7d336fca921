//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite database files using sqlx.

use crate::db::{ColumnInfo, DatabaseClient, ResultTable, Row, Value};
use crate::error::{BatchError, QueryFailureKind, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// SQLite primary result code for disk I/O errors.
const SQLITE_IOERR: u32 = 10;

/// SQLite primary result code for a malformed database image.
const SQLITE_CORRUPT: u32 = 11;

/// Read-only SQLite client holding a single connection.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteClient {
    /// Opens an existing SQLite database file read-only.
    ///
    /// Fails with a connection error if the file is missing or is not a
    /// SQLite database.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BatchError::connection(format!(
                "Database file '{}' does not exist.",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(5));

        // One connection: statements run strictly one after another.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| map_connection_error(e, path))?;

        // Opening succeeds lazily on non-database files; touch the schema now
        // so that surfaces before any query runs.
        if let Err(e) = sqlx::query("SELECT count(*) FROM sqlite_master")
            .fetch_one(&pool)
            .await
        {
            pool.close().await;
            return Err(map_connection_error(e, path));
        }

        debug!("Opened database {}", path.display());
        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Fetches column metadata for a statement that returned no rows.
    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).describe(sql).await {
            Ok(described) => described
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), declared_type(col.type_info().name())))
                .collect(),
            Err(e) => {
                warn!("Could not describe empty result set: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<ResultTable> {
        let start = Instant::now();

        let mut columns: Option<Vec<ColumnInfo>> = None;
        let mut rows: Vec<Row> = Vec::new();

        let mut stream = sqlx::query(sql).fetch(&self.pool);
        while let Some(row) = stream.try_next().await.map_err(map_query_error)? {
            let width = columns
                .get_or_insert_with(|| {
                    row.columns()
                        .iter()
                        .map(|col| {
                            ColumnInfo::new(col.name(), declared_type(col.type_info().name()))
                        })
                        .collect()
                })
                .len();
            // Rows from a second result set would not line up with the header
            if row.columns().len() != width {
                return Err(BatchError::execution(
                    QueryFailureKind::Execution,
                    format!(
                        "statement produced rows of {} and {} columns; run each statement as its own query",
                        width,
                        row.columns().len()
                    ),
                ));
            }
            rows.push(convert_row(&row)?);
        }
        drop(stream);

        let execution_time = start.elapsed();

        let columns = match columns {
            Some(columns) => columns,
            None => self.fetch_column_metadata(sql).await,
        };

        debug!("Query returned {} rows in {:?}", rows.len(), execution_time);

        Ok(ResultTable::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        debug!("Closed database {}", self.path.display());
        Ok(())
    }
}

/// Normalizes the engine's "no declared type" marker to an empty string.
fn declared_type(name: &str) -> String {
    if name.eq_ignore_ascii_case("NULL") {
        String::new()
    } else {
        name.to_string()
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single value using its runtime storage class.
///
/// SQLite columns are dynamically typed, so the declared column type says
/// nothing reliable about an individual value: a `quantityInStock` declared
/// INTEGER may still hold TEXT. The value's own type decides.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(|e| decode_error(row, index, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_uppercase();

    let value = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).map(Value::Int),
        "REAL" => row.try_get::<f64, _>(index).map(Value::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        // TEXT, plus anything exotic the driver reports: read as text.
        _ => row.try_get_unchecked::<String, _>(index).map(Value::String),
    };

    value.map_err(|e| decode_error(row, index, e))
}

/// Reports a value the driver could not decode, naming its column.
fn decode_error(row: &SqliteRow, index: usize, error: sqlx::Error) -> BatchError {
    let column = row
        .columns()
        .get(index)
        .map(|col| col.name().to_string())
        .unwrap_or_else(|| format!("#{index}"));
    BatchError::execution(
        QueryFailureKind::Execution,
        format!("failed to decode column '{column}': {error}"),
    )
}

/// Maps sqlx errors raised while opening the database to user-facing messages.
fn map_connection_error(error: sqlx::Error, path: &Path) -> BatchError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("not a database") {
        BatchError::connection(format!("'{}' is not a SQLite database.", path.display()))
    } else if error_str.contains("unable to open") {
        BatchError::connection(format!(
            "Cannot open '{}'. Check the path and file permissions.",
            path.display()
        ))
    } else {
        BatchError::connection(format!("{}: {error}", path.display()))
    }
}

/// Maps a failed statement to an unattributed query error.
fn map_query_error(error: sqlx::Error) -> BatchError {
    match &error {
        sqlx::Error::Database(db_error) => {
            let kind = match db_error
                .code()
                .and_then(|code| code.parse::<u32>().ok())
                .map(|code| code & 0xff)
            {
                Some(SQLITE_IOERR) | Some(SQLITE_CORRUPT) => QueryFailureKind::Io,
                _ => QueryFailureKind::Execution,
            };
            BatchError::execution(kind, db_error.message())
        }
        sqlx::Error::Io(e) => BatchError::execution(QueryFailureKind::Io, e.to_string()),
        _ => BatchError::execution(QueryFailureKind::Execution, error.to_string()),
    }
}
