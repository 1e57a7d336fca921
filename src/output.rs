//! Tabular output for batch results.
//!
//! Renders each labeled outcome as it arrives, preserving column order and
//! row order exactly as given. Text output is an aligned table with a row
//! index; JSON output is one object per line.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::ResultTable;
use crate::error::{BatchError, Result};
use crate::query::{BatchSummary, OutcomeSink, QueryOutcome};

/// Column separator in text output.
const COLUMN_GAP: &str = "  ";

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text tables.
    #[default]
    Text,
    /// One JSON object per outcome, newline separated.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Writes outcomes to `writer` in the chosen format.
///
/// Tables are written and dropped immediately; nothing is retained.
pub struct Renderer<W: Write> {
    format: OutputFormat,
    writer: W,
}

impl<W: Write> Renderer<W> {
    /// Creates a renderer writing to `writer`.
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self { format, writer }
    }

    /// Writes the end-of-batch summary.
    pub fn write_summary(&mut self, summary: &BatchSummary) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.writer.write_all(render_summary(summary).as_bytes())?,
            OutputFormat::Json => {
                let line = json!({ "summary": summary });
                writeln!(self.writer, "{line}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutcomeSink for Renderer<W> {
    fn accept(&mut self, outcome: QueryOutcome) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Text => render_outcome_text(&outcome),
            OutputFormat::Json => render_outcome_json(&outcome)?,
        };
        self.writer.write_all(rendered.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Renders one outcome as a text block followed by a blank line.
pub fn render_outcome_text(outcome: &QueryOutcome) -> String {
    let mut out = format!("== {} ==\n", outcome.label);
    match &outcome.result {
        Ok(table) => out.push_str(&render_table(table)),
        Err(e) => out.push_str(&format!("FAILED ({}): {}\n", e.kind, e.message)),
    }
    out.push('\n');
    out
}

fn render_outcome_json(outcome: &QueryOutcome) -> Result<String> {
    let value = match &outcome.result {
        Ok(table) => json!({
            "index": outcome.index,
            "label": outcome.label,
            "columns": table.column_names(),
            "rows": table.rows,
            "truncated_from": table.truncated_from,
        }),
        Err(e) => json!({
            "index": outcome.index,
            "label": outcome.label,
            "error": { "kind": e.kind, "message": e.message },
        }),
    };
    serde_json::to_string(&value)
        .map(|line| line + "\n")
        .map_err(|e| BatchError::output(format!("Failed to encode {}: {e}", outcome.label)))
}

/// Renders a table as aligned text with a leading row-index column.
pub fn render_table(table: &ResultTable) -> String {
    let index_width = table.row_count().saturating_sub(1).to_string().len();

    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_display_string()).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|row| display_width(&row[i]))
                .chain(std::iter::once(display_width(&col.name)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();

    let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    push_line(&mut out, &" ".repeat(index_width), &header, &widths);

    for (i, row) in cells.iter().enumerate() {
        let index = format!("{i:>index_width$}");
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut out, &index, &row, &widths);
    }

    out.push_str(&format!(
        "[{} rows x {} columns]",
        table.row_count(),
        table.columns.len()
    ));
    if let Some(note) = table.truncation_warning() {
        out.push_str(&format!(" ({note})"));
    }
    out.push('\n');
    out
}

fn push_line(out: &mut String, index: &str, cells: &[&str], widths: &[usize]) {
    let mut line = index.to_string();
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(COLUMN_GAP);
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(display_width(cell))));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

/// Renders the succeeded/failed label listing.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = format!(
        "Summary: {} succeeded, {} failed\n",
        summary.succeeded.len(),
        summary.failed.len()
    );
    for label in &summary.succeeded {
        out.push_str(&format!("  ok      {label}\n"));
    }
    for failure in &summary.failed {
        out.push_str(&format!(
            "  FAILED  {} (#{}): {}\n",
            failure.label,
            failure.index + 1,
            failure.message
        ));
    }
    out
}
