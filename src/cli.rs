//! Command-line argument parsing for query-batch.
//!
//! Uses clap to parse CLI arguments. Exactly one query source is required:
//! a batch file, the built-in batch, or one or more `-e` statements.

use crate::batch::Batch;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputFormat;
use crate::query::{OnError, QueryDescriptor};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Run a batch of read-only SQL queries against a SQLite file and print each
/// result table.
#[derive(Parser, Debug)]
#[command(name = "qbatch")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("queries")
        .required(true)
        .args(["batch", "builtin", "execute"])
))]
pub struct Cli {
    /// SQLite database file (overrides config and QBATCH_DATABASE)
    #[arg(value_name = "DATABASE")]
    pub database: Option<PathBuf>,

    /// TOML batch file with [[query]] entries
    #[arg(short = 'b', long, value_name = "PATH")]
    pub batch: Option<PathBuf>,

    /// Run the built-in products/orders exploration batch
    #[arg(long)]
    pub builtin: bool,

    /// Execute a single SQL statement (repeatable; labelled query_1, query_2, ...)
    #[arg(short = 'e', long = "execute", value_name = "SQL")]
    pub execute: Vec<String>,

    /// What to do when a query fails: abort or continue
    #[arg(long, value_name = "POLICY")]
    pub on_error: Option<String>,

    /// Output format: text or json
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the --on-error argument, if given.
    pub fn parse_on_error(&self) -> std::result::Result<Option<OnError>, String> {
        self.on_error.as_deref().map(str::parse).transpose()
    }

    /// Parses the --format argument, if given.
    pub fn parse_output_format(&self) -> std::result::Result<Option<OutputFormat>, String> {
        self.format.as_deref().map(str::parse).transpose()
    }

    /// Builds the batch selected on the command line.
    pub fn resolve_batch(&self) -> Result<Batch> {
        if let Some(path) = &self.batch {
            return Batch::load_from_file(path);
        }
        if self.builtin {
            return Ok(Batch::builtin());
        }
        Batch::new(
            self.execute
                .iter()
                .enumerate()
                .map(|(i, sql)| QueryDescriptor::new(format!("query_{}", i + 1), sql.as_str()))
                .collect(),
        )
    }
}
