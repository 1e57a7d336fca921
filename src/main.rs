//! qbatch - run batches of read-only SQL queries against a SQLite file.

use std::path::{Path, PathBuf};

use query_batch::batch::Batch;
use query_batch::cli::Cli;
use query_batch::config::{Config, DATABASE_ENV};
use query_batch::db;
use query_batch::error::{BatchError, Result};
use query_batch::logging;
use query_batch::output::{OutputFormat, Renderer};
use query_batch::query::{OnError, QueryRunner};
use tracing::{error, info};

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the batch. Returns whether every query succeeded.
fn run(cli: &Cli) -> Result<bool> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.source.apply_env_defaults();

    // Precedence: CLI argument, config file, environment
    let database = resolve_database(cli, &config)?;
    let on_error = cli
        .parse_on_error()
        .map_err(BatchError::config)?
        .unwrap_or(config.runner.on_error);
    let format = cli
        .parse_output_format()
        .map_err(BatchError::config)?
        .unwrap_or(config.output.format);

    let batch = cli.resolve_batch()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BatchError::internal(format!("Failed to start runtime: {e}")))?;

    runtime.block_on(execute(&database, &batch, on_error, format))
}

fn resolve_database(cli: &Cli, config: &Config) -> Result<PathBuf> {
    cli.database
        .clone()
        .or_else(|| config.source.path.clone())
        .ok_or_else(|| {
            BatchError::config(format!(
                "No database given. Pass a path, set [source] path in the config file, or set {DATABASE_ENV}."
            ))
        })
}

async fn execute(
    database: &Path,
    batch: &Batch,
    on_error: OnError,
    format: OutputFormat,
) -> Result<bool> {
    info!("Database: {}", database.display());
    let handle = db::open(database).await?;

    let mut renderer = Renderer::new(format, std::io::stdout());
    let summary = QueryRunner::new(handle, on_error)
        .run(batch.queries(), &mut renderer)
        .await?;

    if on_error == OnError::Continue {
        renderer.write_summary(&summary)?;
    }

    Ok(summary.is_success())
}
