//! Batch query execution for query-batch.
//!
//! Holds the query descriptor type and the runner that executes a batch of
//! descriptors in order against one database handle.

mod descriptor;
mod runner;

pub use descriptor::QueryDescriptor;
pub use runner::{BatchSummary, OnError, OutcomeSink, QueryOutcome, QueryRunner};
