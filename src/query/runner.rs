//! Sequential batch execution with a configurable failure policy.
//!
//! The runner owns the database handle for the whole batch, executes each
//! descriptor to completion before starting the next, and hands every outcome
//! to a sink as soon as it exists. It keeps no results itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::db::{DatabaseClient, ResultTable};
use crate::error::{BatchError, QueryExecutionError, QueryFailureKind, Result};
use crate::safety::SqlClassifier;

use super::QueryDescriptor;

/// What to do when a query in the batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Record the failure and run the remaining queries.
    Continue,
}

impl FromStr for OnError {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            _ => Err(format!("Invalid on-error policy: {s}. Expected: abort or continue")),
        }
    }
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// The outcome of one descriptor in the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Zero-based position in the batch.
    pub index: usize,
    pub label: String,
    pub result: std::result::Result<ResultTable, QueryExecutionError>,
}

impl QueryOutcome {
    /// Returns the table if the query succeeded.
    pub fn table(&self) -> Option<&ResultTable> {
        self.result.as_ref().ok()
    }

    /// Returns the failure if the query failed.
    pub fn error(&self) -> Option<&QueryExecutionError> {
        self.result.as_ref().err()
    }
}

/// Consumer of query outcomes, in batch order.
pub trait OutcomeSink {
    /// Receives the next outcome. An error here stops the batch.
    fn accept(&mut self, outcome: QueryOutcome) -> Result<()>;
}

/// Collects outcomes in order.
impl OutcomeSink for Vec<QueryOutcome> {
    fn accept(&mut self, outcome: QueryOutcome) -> Result<()> {
        self.push(outcome);
        Ok(())
    }
}

/// Which labels succeeded and which failed, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<QueryExecutionError>,
}

impl BatchSummary {
    /// Returns true if no query failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the number of queries that ran to an outcome.
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Executes a batch of query descriptors against one database handle.
pub struct QueryRunner {
    client: Box<dyn DatabaseClient>,
    on_error: OnError,
    classifier: SqlClassifier,
}

impl QueryRunner {
    /// Creates a runner that takes exclusive ownership of `client`.
    pub fn new(client: Box<dyn DatabaseClient>, on_error: OnError) -> Self {
        Self {
            client,
            on_error,
            classifier: SqlClassifier::new(),
        }
    }

    /// Runs every descriptor in order, handing each outcome to `sink`.
    ///
    /// The handle is closed before this returns, whether the batch completed
    /// or stopped early. Under [`OnError::Abort`] the first failure is
    /// returned as [`BatchError::Query`]; outcomes already handed to the sink
    /// stay there and nothing is produced for the failing or later
    /// descriptors.
    pub async fn run<S>(self, queries: &[QueryDescriptor], sink: &mut S) -> Result<BatchSummary>
    where
        S: OutcomeSink + ?Sized,
    {
        info!(
            "Running batch of {} queries (on error: {})",
            queries.len(),
            self.on_error
        );

        let result = self.run_queries(queries, sink).await;

        if let Err(e) = self.client.close().await {
            warn!("Failed to close database: {e}");
        }

        if let Ok(summary) = &result {
            info!(
                "Batch finished: {} succeeded, {} failed",
                summary.succeeded.len(),
                summary.failed.len()
            );
        }
        result
    }

    async fn run_queries<S>(
        &self,
        queries: &[QueryDescriptor],
        sink: &mut S,
    ) -> Result<BatchSummary>
    where
        S: OutcomeSink + ?Sized,
    {
        let mut summary = BatchSummary::default();

        for (index, query) in queries.iter().enumerate() {
            debug!("[{}/{}] {}", index + 1, queries.len(), query.label());

            let result = self.execute(index, query).await;

            match &result {
                Ok(_) => summary.succeeded.push(query.label().to_string()),
                Err(e) => match self.on_error {
                    OnError::Abort => {
                        error!("{e}");
                        return Err(BatchError::Query(e.clone()));
                    }
                    OnError::Continue => {
                        warn!("{e}");
                        summary.failed.push(e.clone());
                    }
                },
            }

            sink.accept(QueryOutcome {
                index,
                label: query.label().to_string(),
                result,
            })?;
        }

        Ok(summary)
    }

    /// Executes one descriptor and attributes any failure to it.
    async fn execute(
        &self,
        index: usize,
        query: &QueryDescriptor,
    ) -> std::result::Result<ResultTable, QueryExecutionError> {
        let classification = self.classifier.classify(query.text());
        if classification.is_rejected() {
            return Err(QueryExecutionError {
                index,
                label: query.label().to_string(),
                kind: QueryFailureKind::ReadOnly,
                message: format!(
                    "{} statements are not allowed in a read-only batch",
                    classification.statement_type
                ),
            });
        }
        if classification.is_multi_statement() {
            return Err(QueryExecutionError {
                index,
                label: query.label().to_string(),
                kind: QueryFailureKind::MultipleStatements,
                message: "each query must be a single statement".to_string(),
            });
        }

        let mut table = match self.client.execute_query(query.text()).await {
            Ok(table) => table,
            Err(BatchError::Query(e)) => return Err(e.attributed(index, query.label())),
            Err(other) => {
                return Err(QueryExecutionError {
                    index,
                    label: query.label().to_string(),
                    kind: QueryFailureKind::Execution,
                    message: other.to_string(),
                })
            }
        };

        if let Some(head) = query.head() {
            let total = table.rows.len();
            if total > head {
                table.rows.truncate(head);
                table.truncated_from = Some(total);
            }
        }

        debug!(
            "{}: {} rows in {:?}",
            query.label(),
            table.row_count(),
            table.execution_time
        );
        Ok(table)
    }
}
