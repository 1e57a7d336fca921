//! Declarative query descriptors.

use serde::{Deserialize, Serialize};

/// A named, immutable SQL query.
///
/// The text is sent to the engine verbatim. Numeric ordering of values stored
/// as text needs an explicit `CAST` in the text itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    label: String,

    #[serde(alias = "sql")]
    text: String,

    /// Keep only the first `head` rows of the engine's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    head: Option<usize>,
}

impl QueryDescriptor {
    /// Creates a descriptor with the given label and SQL text.
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            head: None,
        }
    }

    /// Returns a copy that keeps only the first `rows` rows of the result.
    ///
    /// Unlike `LIMIT`, the engine still produces the full result; the cap is
    /// applied afterwards in engine order.
    pub fn with_head(mut self, rows: usize) -> Self {
        self.head = Some(rows);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn head(&self) -> Option<usize> {
        self.head
    }
}
