//! Pieces shared by `dnslg-check` and `dnslg-query`.

pub mod config;

use tracing_subscriber::{prelude::*, EnvFilter};

/// Logs go to stderr so stdout carries nothing but outcome lines.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}
