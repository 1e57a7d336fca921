//! Logging configuration for query-batch.
//!
//! Logs go to stderr so that rendered tables on stdout stay machine-readable.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Returns the default filter directive for the given `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Initializes logging to stderr.
pub fn init_stderr_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
