//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Level used when the configured filter does not parse.
const FALLBACK_FILTER: &str = "info";

/// Resolve the active filter: `RUST_LOG` first, then the configured default.
///
/// An unparsable configured filter degrades to `info` instead of silencing
/// the process.
pub fn resolve_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Initialize JSON tracing for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_filter: &str) {
    // JSON logs + timestamps. Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(resolve_filter(default_filter))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
