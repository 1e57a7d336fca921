//! Mock database client for testing.
//!
//! Returns scripted tables or failures per SQL statement and records what
//! was executed, so runner behaviour can be checked without a database file.

use super::{DatabaseClient, ResultTable};
use crate::error::{BatchError, QueryFailureKind, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Scripted {
    Table(ResultTable),
    Failure(QueryFailureKind, String),
}

/// A mock database client that returns predefined results.
///
/// Statements without a scripted response fail the way SQLite reports a
/// missing table.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    responses: HashMap<String, Scripted>,
    probe: MockProbe,
}

/// Observes a [`MockDatabaseClient`] after it has been handed to a runner.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    executed: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockProbe {
    /// Returns the statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns true once the client has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl MockDatabaseClient {
    /// Creates a new mock client with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `sql` to return `table`.
    pub fn with_table(mut self, sql: impl Into<String>, table: ResultTable) -> Self {
        self.responses.insert(sql.into(), Scripted::Table(table));
        self
    }

    /// Scripts `sql` to fail with the given kind and engine message.
    pub fn with_failure(
        mut self,
        sql: impl Into<String>,
        kind: QueryFailureKind,
        message: impl Into<String>,
    ) -> Self {
        self.responses
            .insert(sql.into(), Scripted::Failure(kind, message.into()));
        self
    }

    /// Returns a probe that stays valid after the client is moved.
    pub fn probe(&self) -> MockProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<ResultTable> {
        if self.probe.is_closed() {
            return Err(BatchError::internal("query on closed mock client"));
        }
        if let Ok(mut executed) = self.probe.executed.lock() {
            executed.push(sql.to_string());
        }

        match self.responses.get(sql) {
            Some(Scripted::Table(table)) => Ok(table.clone()),
            Some(Scripted::Failure(kind, message)) => {
                Err(BatchError::execution(*kind, message.clone()))
            }
            None => Err(BatchError::execution(
                QueryFailureKind::Execution,
                format!("no such table in mock: {sql}"),
            )),
        }
    }

    async fn close(&self) -> Result<()> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
