//! SQL parsing and read-only classification.
//!
//! Uses sqlparser-rs with the SQLite dialect.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use super::{Access, Classification, StatementType};

/// SQL classifier that parses and classifies SQL queries.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: SQLiteDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    /// Creates a new SQL classifier.
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Classifies a SQL string.
    ///
    /// SQL that cannot be parsed, or that contains no statement, is
    /// `Access::Unknown`: its validity is for the engine to report.
    pub fn classify(&self, sql: &str) -> Classification {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) if !statements.is_empty() => statements,
            _ => return Classification::new(Access::Unknown, StatementType::Unknown),
        };

        if statements.len() == 1 {
            let (access, stmt_type) = classify_statement(&statements[0]);
            return Classification::new(access, stmt_type);
        }

        let classified: Vec<_> = statements.iter().map(classify_statement).collect();
        let (access, stmt_type) = classified
            .iter()
            .find(|(access, _)| *access == Access::Write)
            .or_else(|| classified.first())
            .cloned()
            .unwrap_or((Access::Unknown, StatementType::Unknown));

        Classification::new(access, StatementType::Multiple(Box::new(stmt_type)))
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Classification {
    SqlClassifier::new().classify(sql)
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (Access, StatementType) {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE runs the inner statement
                let (inner, _) = classify_statement(statement);
                (inner, StatementType::Explain)
            } else {
                (Access::ReadOnly, StatementType::Explain)
            }
        }
        // `PRAGMA name` and `PRAGMA name(arg)` read; `PRAGMA name = value` sets
        Statement::Pragma { is_eq, .. } => {
            if *is_eq {
                (Access::Write, StatementType::Pragma)
            } else {
                (Access::ReadOnly, StatementType::Pragma)
            }
        }

        Statement::Insert(_) => (Access::Write, StatementType::Insert),
        Statement::Update { .. } => (Access::Write, StatementType::Update),
        Statement::Delete(_) => (Access::Write, StatementType::Delete),
        Statement::Drop { .. } => (Access::Write, StatementType::Drop),
        Statement::AlterTable { .. } => (Access::Write, StatementType::Alter),
        Statement::CreateTable { .. } => (Access::Write, StatementType::Create),
        Statement::CreateIndex { .. } => (Access::Write, StatementType::Create),
        Statement::CreateView { .. } => (Access::Write, StatementType::Create),

        // Anything else parsed (ATTACH, VACUUM, transactions, ...) is not a query
        _ => (Access::Write, StatementType::Unknown),
    }
}

/// Classifies a Query, including its CTEs.
fn classify_query(query: &Query) -> (Access, StatementType) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            let classified = classify_query(&cte.query);
            if classified.0 == Access::Write {
                return classified;
            }
        }
    }

    classify_set_expr(&query.body)
}

/// Classifies a SetExpr, recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (Access, StatementType) {
    match set_expr {
        SetExpr::Select(select) => classify_select(select),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            let left = classify_set_expr(left);
            if left.0 == Access::Write {
                return left;
            }
            classify_set_expr(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (Access::ReadOnly, StatementType::Select),
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (Access, StatementType) {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .find(|(access, _)| *access == Access::Write)
        .unwrap_or((Access::ReadOnly, StatementType::Select))
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (Access, StatementType) {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .find(|(access, _)| *access == Access::Write)
        .unwrap_or((Access::ReadOnly, StatementType::Select))
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (Access, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (Access::ReadOnly, StatementType::Select),
    }
}
