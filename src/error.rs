//! Error types for query-batch.
//!
//! Defines the main error enum used throughout the crate, plus the per-query
//! failure record that the runner either propagates or records.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for query-batch operations.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Database could not be opened (missing file, permissions, not a database).
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single query in the batch failed.
    #[error("{0}")]
    Query(QueryExecutionError),

    /// Configuration errors (invalid config file, malformed batch file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rendering or writing a result failed.
    #[error("Output error: {0}")]
    Output(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BatchError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an output error with the given message.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates a query execution failure that is not yet attributed to a label.
    ///
    /// Database clients only see SQL text; the runner fills in the label and
    /// position with [`QueryExecutionError::attributed`].
    pub fn execution(kind: QueryFailureKind, msg: impl Into<String>) -> Self {
        Self::Query(QueryExecutionError {
            index: 0,
            label: String::new(),
            kind,
            message: msg.into(),
        })
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Output(_) => "Output Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<std::io::Error> for BatchError {
    fn from(e: std::io::Error) -> Self {
        Self::Output(e.to_string())
    }
}

/// Why a single query failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFailureKind {
    /// The engine rejected the statement (syntax error, missing table or column).
    Execution,
    /// The storage layer failed mid-query. Handled like `Execution` by the runner.
    Io,
    /// The statement would write to the database and was never sent.
    ReadOnly,
    /// The text holds more than one statement and was never sent.
    MultipleStatements,
}

impl fmt::Display for QueryFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execution => write!(f, "execution failed"),
            Self::Io => write!(f, "I/O failure"),
            Self::ReadOnly => write!(f, "rejected (not read-only)"),
            Self::MultipleStatements => write!(f, "rejected (multiple statements)"),
        }
    }
}

/// A failed query, attributed to its label and position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryExecutionError {
    /// Zero-based position of the query in the batch.
    pub index: usize,
    /// Label of the failing query.
    pub label: String,
    pub kind: QueryFailureKind,
    /// Underlying engine message.
    pub message: String,
}

impl QueryExecutionError {
    /// Returns a copy of this error attributed to the given batch position.
    pub fn attributed(mut self, index: usize, label: impl Into<String>) -> Self {
        self.index = index;
        self.label = label.into();
        self
    }
}

impl fmt::Display for QueryExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "Query {}: {}", self.kind, self.message)
        } else {
            write!(
                f,
                "Query '{}' (#{}) {}: {}",
                self.label,
                self.index + 1,
                self.kind,
                self.message
            )
        }
    }
}

impl std::error::Error for QueryExecutionError {}

impl From<QueryExecutionError> for BatchError {
    fn from(e: QueryExecutionError) -> Self {
        Self::Query(e)
    }
}

/// Result type alias using BatchError.
pub type Result<T> = std::result::Result<T, BatchError>;
