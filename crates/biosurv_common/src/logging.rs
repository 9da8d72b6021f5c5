//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt layer on stderr. `RUST_LOG` wins over
//! the configured level. Safe to call more than once.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Map a configured level to a filter directive, defaulting to `info`
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Initialize the global subscriber. Returns false if one was already set.
pub fn init(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&config.level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
