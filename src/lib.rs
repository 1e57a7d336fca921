//! query-batch - run batches of read-only SQL queries against a SQLite file.
//!
//! This library exposes the core modules for the `qbatch` binary and for
//! integration tests.

pub mod batch;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod safety;
