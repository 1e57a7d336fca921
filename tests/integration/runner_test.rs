//! Batch runner tests against a real SQLite file.

use pretty_assertions::assert_eq;
use query_batch::error::{BatchError, QueryFailureKind};
use query_batch::query::{OnError, QueryDescriptor};

use super::common::{create_fixture, query_table, run_batch};

fn batch_with_malformed_middle() -> Vec<QueryDescriptor> {
    vec![
        QueryDescriptor::new("count_orders", "SELECT count(*) AS n FROM orders"),
        QueryDescriptor::new("malformed", "SELEC * FROM orders"),
        QueryDescriptor::new("count_products", "SELECT count(*) AS n FROM products"),
    ]
}

#[tokio::test]
async fn test_abort_stops_at_first_failure() {
    let fixture = create_fixture().await;

    let (outcomes, result) =
        run_batch(&fixture, &batch_with_malformed_middle(), OnError::Abort).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].label, "count_orders");

    let Err(BatchError::Query(e)) = result else {
        panic!("Expected query error, got {:?}", result);
    };
    assert_eq!(e.index, 1);
    assert_eq!(e.label, "malformed");
    assert_eq!(e.kind, QueryFailureKind::Execution);
    assert!(e.to_string().contains("'malformed'"), "{}", e);
}

#[tokio::test]
async fn test_continue_runs_every_query() {
    let fixture = create_fixture().await;

    let (outcomes, result) =
        run_batch(&fixture, &batch_with_malformed_middle(), OnError::Continue).await;
    let summary = result.unwrap();

    let labels: Vec<_> = outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["count_orders", "malformed", "count_products"]);
    assert!(outcomes[1].error().is_some());
    assert_eq!(
        outcomes[2].table().unwrap().get(0, "n").and_then(|v| v.as_i64()),
        Some(5)
    );

    assert_eq!(summary.succeeded, vec!["count_orders", "count_products"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].label, "malformed");
    assert!(!summary.is_success());
}

#[tokio::test]
async fn test_write_statement_is_rejected_and_data_unchanged() {
    let fixture = create_fixture().await;
    let queries = vec![
        QueryDescriptor::new("purge", "DELETE FROM orders"),
        QueryDescriptor::new("count", "SELECT count(*) AS n FROM orders"),
    ];

    let (outcomes, result) = run_batch(&fixture, &queries, OnError::Continue).await;
    result.unwrap();

    let rejected = outcomes[0].error().unwrap();
    assert_eq!(rejected.kind, QueryFailureKind::ReadOnly);

    let table = outcomes[1].table().unwrap();
    assert_eq!(table.get(0, "n").and_then(|v| v.as_i64()), Some(7));
}

#[tokio::test]
async fn test_write_inside_cte_is_not_executed() {
    let fixture = create_fixture().await;
    let queries = vec![QueryDescriptor::new(
        "sneaky",
        "WITH x AS (SELECT 1) INSERT INTO stock_levels SELECT '1' FROM x",
    )];

    let (_, result) = run_batch(&fixture, &queries, OnError::Abort).await;

    assert!(matches!(result, Err(BatchError::Query(_))));
    let table = query_table(&fixture, "SELECT count(*) AS n FROM stock_levels").await;
    assert_eq!(table.get(0, "n").and_then(|v| v.as_i64()), Some(3));
}

#[tokio::test]
async fn test_multi_statement_query_fails_instead_of_merging_tables() {
    let fixture = create_fixture().await;
    let queries = vec![
        QueryDescriptor::new("multi", "SELECT 1 AS a, 2 AS b; SELECT 3 AS c"),
        QueryDescriptor::new("single", "SELECT 3 AS c"),
    ];

    let (outcomes, result) = run_batch(&fixture, &queries, OnError::Continue).await;
    let summary = result.unwrap();

    let failure = outcomes[0].error().unwrap();
    assert_eq!(failure.index, 0);
    assert_eq!(failure.label, "multi");
    assert_eq!(failure.kind, QueryFailureKind::MultipleStatements);
    assert!(outcomes[0].table().is_none());

    let table = outcomes[1].table().unwrap();
    assert_eq!(table.column_names(), vec!["c"]);
    assert_eq!(summary.succeeded, vec!["single"]);
}

#[tokio::test]
async fn test_head_truncates_preview() {
    let fixture = create_fixture().await;
    let queries =
        vec![QueryDescriptor::new("orders", "SELECT orderNumber FROM orders").with_head(2)];

    let (outcomes, result) = run_batch(&fixture, &queries, OnError::Abort).await;
    result.unwrap();

    let table = outcomes[0].table().unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.truncated_from, Some(7));
}
