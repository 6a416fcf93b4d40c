//! Logging initialization
//!
//! `RUST_LOG` always takes precedence over the configured filter; with
//! neither set the node logs at `info`.
//!
//! ```rust,no_run
//! use clam_node::utils::init_logging;
//!
//! init_logging(None).expect("logging already initialized");
//! ```

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter chosen from `RUST_LOG`, then `configured`, then "info"
pub fn resolve_filter(configured: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(configured.unwrap_or("info"))
}

/// Human-readable logs on stderr
pub fn init_logging(filter: Option<&str>) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(resolve_filter(filter))
        .try_init()
        .context("failed to install tracing subscriber")
}

/// One JSON object per line, for log aggregation
pub fn init_json_logging(filter: Option<&str>) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(resolve_filter(filter))
        .try_init()
        .context("failed to install JSON tracing subscriber")
}

pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    let filter = config.filter.as_deref();
    if config.json_format {
        init_json_logging(filter)
    } else {
        init_logging(filter)
    }
}
