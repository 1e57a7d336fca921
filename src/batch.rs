//! Batch sources: TOML batch files and the built-in exploration batch.
//!
//! A batch file is a list of `[[query]]` tables:
//!
//! ```toml
//! [[query]]
//! label = "sort_in_stock_int"
//! sql = "SELECT productName, quantityInStock FROM products ORDER BY CAST(quantityInStock AS INTEGER)"
//! head = 10
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BatchError, Result};
use crate::query::QueryDescriptor;

/// An ordered, validated list of query descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Batch {
    #[serde(default, rename = "query")]
    queries: Vec<QueryDescriptor>,
}

impl Batch {
    /// Creates a batch from descriptors, rejecting empty or duplicate labels
    /// and empty SQL.
    pub fn new(queries: Vec<QueryDescriptor>) -> Result<Self> {
        let batch = Self { queries };
        batch.validate()?;
        Ok(batch)
    }

    /// Loads a batch from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BatchError::config(format!(
                "Failed to read batch file {}: {e}",
                path.display()
            ))
        })?;

        Self::parse_toml(&content).map_err(|e| match e {
            BatchError::Config(msg) => BatchError::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parses and validates a batch from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let batch: Batch = toml::from_str(content)
            .map_err(|e| BatchError::config(format!("Invalid batch file:\n  {e}")))?;
        batch.validate()?;
        Ok(batch)
    }

    /// Returns the descriptors in execution order.
    pub fn queries(&self) -> &[QueryDescriptor] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (i, query) in self.queries.iter().enumerate() {
            if query.label().trim().is_empty() {
                return Err(BatchError::config(format!("query #{} has an empty label", i + 1)));
            }
            if query.text().trim().is_empty() {
                return Err(BatchError::config(format!(
                    "query '{}' has empty SQL",
                    query.label()
                )));
            }
            if !seen.insert(query.label()) {
                return Err(BatchError::config(format!(
                    "duplicate query label '{}'",
                    query.label()
                )));
            }
        }
        Ok(())
    }

    /// The product and order exploration batch over the `products` and
    /// `orders` tables.
    ///
    /// `sort_in_stock` and `sort_in_stock_10` order a text column without a
    /// cast and therefore sort lexicographically; the `_int` variants show the
    /// numeric order.
    pub fn builtin() -> Self {
        let queries = vec![
            QueryDescriptor::new("order_by_name", "SELECT * FROM products ORDER BY productName;"),
            QueryDescriptor::new(
                "order_by_name_asc",
                "SELECT * FROM products ORDER BY productName ASC;",
            ),
            QueryDescriptor::new(
                "order_by_name_desc",
                "SELECT * FROM products ORDER BY productName DESC;",
            ),
            QueryDescriptor::new(
                "sort_str_length",
                "SELECT productName, length(productDescription) AS description_length \
                 FROM products ORDER BY description_length;",
            ),
            QueryDescriptor::new(
                "sort_str_length_2",
                "SELECT productName FROM products ORDER BY length(productDescription);",
            ),
            QueryDescriptor::new(
                "sort_multiple_columns",
                "SELECT productVendor, productName, MSRP FROM products \
                 ORDER BY productVendor, productName;",
            ),
            QueryDescriptor::new(
                "sort_multiple_columns_weird",
                "SELECT productVendor, productName, MSRP FROM products \
                 ORDER BY productName, productVendor;",
            ),
            QueryDescriptor::new(
                "unique_values",
                "SELECT COUNT(DISTINCT productVendor) AS num_product_vendors, \
                 COUNT(DISTINCT productName) AS num_product_names FROM products;",
            ),
            QueryDescriptor::new(
                "sort_in_stock",
                "SELECT productName, quantityInStock FROM products ORDER BY quantityInStock;",
            ),
            QueryDescriptor::new(
                "sort_in_stock_10",
                "SELECT productName, quantityInStock FROM products ORDER BY quantityInStock;",
            )
            .with_head(10),
            QueryDescriptor::new(
                "sort_in_stock_int",
                "SELECT productName, quantityInStock FROM products \
                 ORDER BY CAST(quantityInStock AS INTEGER);",
            )
            .with_head(10),
            QueryDescriptor::new(
                "sort_in_stock_int_all",
                "SELECT productName, quantityInStock FROM products \
                 ORDER BY CAST(quantityInStock AS INTEGER);",
            ),
            QueryDescriptor::new("limit_order_5", "SELECT * FROM orders LIMIT 5;"),
            QueryDescriptor::new(
                "longest_comments",
                "SELECT * FROM orders ORDER BY length(comments) DESC LIMIT 10;",
            ),
            QueryDescriptor::new(
                "longest_comments_cancelled",
                "SELECT * FROM orders WHERE status = 'Cancelled' \
                 ORDER BY length(comments) DESC LIMIT 10;",
            ),
            QueryDescriptor::new(
                "longest_cancelled_resolved",
                "SELECT * FROM orders WHERE status IN ('Cancelled', 'Resolved') \
                 ORDER BY length(comments) DESC LIMIT 10;",
            ),
            QueryDescriptor::new(
                "newest_order_date",
                "SELECT * FROM orders WHERE shippedDate = '' AND status != 'Cancelled' \
                 ORDER BY orderDate DESC LIMIT 10;",
            ),
            QueryDescriptor::new(
                "longest_to_fulfill",
                "SELECT *, julianday(shippedDate) - julianday(orderDate) AS days_to_fulfill \
                 FROM orders WHERE shippedDate != '' ORDER BY days_to_fulfill DESC LIMIT 1;",
            ),
        ];

        Self { queries }
    }
}
