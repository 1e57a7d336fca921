//! Fixture database shared by the integration tests.

use std::path::PathBuf;

use query_batch::db::{self, ResultTable, Value};
use query_batch::query::{OnError, QueryDescriptor, QueryOutcome, QueryRunner};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

const FIXTURE_SQL: &str = r#"
CREATE TABLE products (
    productCode TEXT PRIMARY KEY,
    productName TEXT NOT NULL,
    productVendor TEXT NOT NULL,
    productDescription TEXT NOT NULL,
    quantityInStock TEXT NOT NULL,
    MSRP REAL NOT NULL
);

INSERT INTO products VALUES
    ('S10_1678', '1969 Harley Davidson Ultimate Chopper', 'Min Lin Diecast',
     'This replica features working kickstand', '2', 95.70),
    ('S10_1949', '1952 Alpine Renault 1300', 'Classic Metal Creations',
     'Turnable front wheels', '10', 214.30),
    ('S10_2016', '1996 Moto Guzzi 1100i', 'Highway 66 Mini Classics',
     'Official Moto Guzzi logos', '9', 118.94),
    ('S12_1099', '1968 Ford Mustang', 'Autoart Studio Design',
     'Hood, doors and trunk all open', '68', 194.57),
    ('S12_1108', '2001 Ferrari Enzo', 'Second Gear Diecast',
     'Turnable front wheels; steering function', '3619', 207.80);

CREATE TABLE orders (
    orderNumber INTEGER PRIMARY KEY,
    orderDate TEXT NOT NULL,
    shippedDate TEXT NOT NULL,
    status TEXT NOT NULL,
    comments TEXT
);

INSERT INTO orders VALUES
    (10100, '2003-01-06', '2003-01-10', 'Shipped', 'short'),
    (10101, '2003-01-09', '2003-01-11', 'Cancelled', 'a much longer cancelled comment'),
    (10102, '2003-01-10', '2003-01-14', 'Resolved', 'resolved after a lengthy dispute with customer'),
    (10103, '2003-01-29', '', 'In Process', NULL),
    (10104, '2003-01-31', '2003-03-01', 'Shipped', 'ok'),
    (10105, '2003-02-11', '', 'Cancelled', 'cancel'),
    (10106, '2003-02-17', '', 'On Hold', 'hold');

CREATE TABLE stock_levels (qty TEXT NOT NULL);
INSERT INTO stock_levels VALUES ('2'), ('10'), ('9');

CREATE TABLE pairs (a TEXT NOT NULL, b TEXT NOT NULL);
INSERT INTO pairs VALUES ('x', '2'), ('x', '1'), ('y', '1');
"#;

/// A fixture database file that lives as long as the returned `TempDir`.
pub struct Fixture {
    pub path: PathBuf,
    _dir: TempDir,
}

/// Creates the fixture database with a writable connection, then closes it.
pub async fn create_fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.sqlite");

    let mut conn = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    sqlx::raw_sql(FIXTURE_SQL).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();

    Fixture { path, _dir: dir }
}

/// Runs `queries` against the fixture and collects every outcome.
pub async fn run_batch(
    fixture: &Fixture,
    queries: &[QueryDescriptor],
    on_error: OnError,
) -> (Vec<QueryOutcome>, query_batch::error::Result<query_batch::query::BatchSummary>) {
    let handle = db::open(&fixture.path).await.unwrap();
    let mut outcomes = Vec::new();
    let result = QueryRunner::new(handle, on_error)
        .run(queries, &mut outcomes)
        .await;
    (outcomes, result)
}

/// Runs a single query and returns its table.
pub async fn query_table(fixture: &Fixture, sql: &str) -> ResultTable {
    let (mut outcomes, result) =
        run_batch(fixture, &[QueryDescriptor::new("q", sql)], OnError::Abort).await;
    result.unwrap();
    outcomes.remove(0).result.unwrap()
}

/// Returns the named column as strings, for order assertions.
pub fn column_strings(table: &ResultTable, column: &str) -> Vec<String> {
    table
        .column_values(column)
        .unwrap()
        .into_iter()
        .map(Value::to_display_string)
        .collect()
}
