//! Query result tests against the fixture database.
//!
//! Covers ordering, casting, derived columns, filtering, limits and value
//! typing as produced by the engine.

use pretty_assertions::assert_eq;
use query_batch::batch::Batch;
use query_batch::db::{self, ResultTable, Value};
use query_batch::error::BatchError;
use query_batch::query::{OnError, QueryDescriptor, QueryOutcome};

use super::common::{column_strings, create_fixture, query_table, run_batch};

#[tokio::test]
async fn test_text_column_orders_lexicographically_without_cast() {
    let fixture = create_fixture().await;

    let table = query_table(&fixture, "SELECT qty FROM stock_levels ORDER BY qty").await;

    assert_eq!(column_strings(&table, "qty"), vec!["10", "2", "9"]);
}

#[tokio::test]
async fn test_cast_orders_text_column_numerically() {
    let fixture = create_fixture().await;

    let table = query_table(
        &fixture,
        "SELECT qty FROM stock_levels ORDER BY CAST(qty AS INTEGER)",
    )
    .await;

    // The cast affects ordering only; values keep their text type.
    assert_eq!(column_strings(&table, "qty"), vec!["2", "9", "10"]);
    assert_eq!(table.get(0, "qty"), Some(&Value::from("2")));
}

#[tokio::test]
async fn test_multi_column_order_tie_break() {
    let fixture = create_fixture().await;

    let a_then_b = query_table(&fixture, "SELECT a, b FROM pairs ORDER BY a, b").await;
    let b_then_a = query_table(&fixture, "SELECT a, b FROM pairs ORDER BY b, a").await;

    assert_eq!(
        a_then_b.rows,
        vec![
            vec![Value::from("x"), Value::from("1")],
            vec![Value::from("x"), Value::from("2")],
            vec![Value::from("y"), Value::from("1")],
        ]
    );
    assert_eq!(
        b_then_a.rows,
        vec![
            vec![Value::from("x"), Value::from("1")],
            vec![Value::from("y"), Value::from("1")],
            vec![Value::from("x"), Value::from("2")],
        ]
    );
}

#[tokio::test]
async fn test_limit_returns_first_rows_of_ordering() {
    let fixture = create_fixture().await;

    let all = query_table(&fixture, "SELECT orderNumber FROM orders ORDER BY orderDate DESC").await;
    let limited = query_table(
        &fixture,
        "SELECT orderNumber FROM orders ORDER BY orderDate DESC LIMIT 3",
    )
    .await;

    assert_eq!(all.row_count(), 7);
    assert_eq!(limited.row_count(), 3);
    assert_eq!(limited.rows[..], all.rows[..3]);
}

#[tokio::test]
async fn test_same_query_twice_is_identical() {
    let fixture = create_fixture().await;
    let sql = "SELECT productVendor, productName, MSRP FROM products ORDER BY productVendor, productName";
    let queries = vec![
        QueryDescriptor::new("first", sql),
        QueryDescriptor::new("second", sql),
    ];

    let (outcomes, result) = run_batch(&fixture, &queries, OnError::Abort).await;
    result.unwrap();

    let first = outcomes[0].table().unwrap();
    let second = outcomes[1].table().unwrap();
    assert_eq!(first.columns, second.columns);
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.row_count(), 5);
}

#[tokio::test]
async fn test_values_keep_storage_types() {
    let fixture = create_fixture().await;

    let table = query_table(
        &fixture,
        "SELECT orderNumber, comments, quantityInStock, MSRP \
         FROM orders, products \
         WHERE orderNumber = 10103 AND productCode = 'S10_1678'",
    )
    .await;

    assert_eq!(
        table.rows,
        vec![vec![
            Value::Int(10103),
            Value::Null,
            Value::from("2"),
            Value::Float(95.70),
        ]]
    );
    assert_eq!(table.columns[0].data_type, "INTEGER");
}

#[tokio::test]
async fn test_derived_columns() {
    let fixture = create_fixture().await;

    let table = query_table(
        &fixture,
        "SELECT orderNumber, julianday(shippedDate) - julianday(orderDate) AS days_to_fulfill \
         FROM orders WHERE shippedDate != '' ORDER BY days_to_fulfill DESC LIMIT 1",
    )
    .await;

    assert_eq!(table.column_names(), vec!["orderNumber", "days_to_fulfill"]);
    assert_eq!(table.rows, vec![vec![Value::Int(10104), Value::Float(29.0)]]);
}

#[tokio::test]
async fn test_filter_with_set_membership() {
    let fixture = create_fixture().await;

    let table = query_table(
        &fixture,
        "SELECT orderNumber FROM orders WHERE status IN ('Cancelled', 'Resolved') \
         ORDER BY length(comments) DESC LIMIT 10",
    )
    .await;

    assert_eq!(column_strings(&table, "orderNumber"), vec!["10102", "10101", "10105"]);
}

#[tokio::test]
async fn test_filter_with_negation() {
    let fixture = create_fixture().await;

    let table = query_table(
        &fixture,
        "SELECT orderNumber FROM orders WHERE shippedDate = '' AND status != 'Cancelled' \
         ORDER BY orderDate DESC LIMIT 10",
    )
    .await;

    assert_eq!(column_strings(&table, "orderNumber"), vec!["10106", "10103"]);
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let fixture = create_fixture().await;

    let table = query_table(&fixture, "SELECT orderNumber, status FROM orders WHERE 1 = 0").await;

    assert!(table.is_empty());
    assert_eq!(table.column_names(), vec!["orderNumber", "status"]);
}

#[tokio::test]
async fn test_missing_table_reports_engine_message() {
    let fixture = create_fixture().await;
    let queries = vec![QueryDescriptor::new("typo", "SELECT * FROM product")];

    let (_, result) = run_batch(&fixture, &queries, OnError::Abort).await;

    match result {
        Err(BatchError::Query(e)) => {
            assert_eq!(e.label, "typo");
            assert!(e.message.contains("no such table"), "{}", e.message);
        }
        other => panic!("Expected query error, got {:?}", other),
    }
}

fn find_table<'a>(outcomes: &'a [QueryOutcome], label: &str) -> &'a ResultTable {
    outcomes
        .iter()
        .find(|o| o.label == label)
        .and_then(|o| o.table())
        .unwrap()
}

#[tokio::test]
async fn test_builtin_batch_runs_against_fixture() {
    let fixture = create_fixture().await;
    let batch = Batch::builtin();

    let (outcomes, result) = run_batch(&fixture, batch.queries(), OnError::Abort).await;
    let summary = result.unwrap();

    assert_eq!(summary.succeeded.len(), 18);
    let table = |label: &str| find_table(&outcomes, label);

    assert_eq!(
        column_strings(table("sort_in_stock"), "quantityInStock"),
        vec!["10", "2", "3619", "68", "9"]
    );
    assert_eq!(
        column_strings(table("sort_in_stock_int"), "quantityInStock"),
        vec!["2", "9", "10", "68", "3619"]
    );
    assert_eq!(
        table("unique_values").rows,
        vec![vec![Value::Int(5), Value::Int(5)]]
    );
    assert_eq!(table("limit_order_5").row_count(), 5);
    assert_eq!(
        table("longest_to_fulfill").get(0, "days_to_fulfill"),
        Some(&Value::Float(29.0))
    );
    assert_eq!(
        column_strings(table("longest_comments"), "orderNumber"),
        vec!["10102", "10101", "10105", "10100", "10106", "10104", "10103"]
    );
}

#[tokio::test]
async fn test_open_missing_database_fails_before_any_query() {
    let dir = tempfile::tempdir().unwrap();

    let result = db::open(&dir.path().join("data.sqlite")).await;

    assert!(matches!(result, Err(BatchError::Connection(_))));
}
