//! Read-only guard for batch queries.
//!
//! Parses SQL and classifies each statement as read-only or writing, so the
//! runner can refuse writes before they reach the database. Statements that
//! do not parse are left for the engine to judge.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use std::fmt;

/// Whether a statement may change the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Only reads data (SELECT, EXPLAIN, read-only PRAGMA).
    ReadOnly,
    /// Modifies data or schema (INSERT, UPDATE, DELETE, CREATE, DROP, ...).
    Write,
    /// Could not be parsed; the engine decides.
    Unknown,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Write => write!(f, "write"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Alter,
    Create,
    Explain,
    Pragma,
    /// Multiple statements detected; contains the first writing one, or the
    /// first statement if none writes.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub access: Access,
    pub statement_type: StatementType,
}

impl Classification {
    /// Creates a new classification.
    pub fn new(access: Access, statement_type: StatementType) -> Self {
        Self {
            access,
            statement_type,
        }
    }

    /// Returns true if the statement must not be sent to the database.
    pub fn is_rejected(&self) -> bool {
        self.access == Access::Write
    }

    /// Returns true if the SQL parsed as more than one statement.
    ///
    /// A query maps to exactly one result table, so these are refused even
    /// when every statement only reads.
    pub fn is_multi_statement(&self) -> bool {
        matches!(self.statement_type, StatementType::Multiple(_))
    }
}
