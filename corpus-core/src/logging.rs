//! Logging initialization for binaries and tests

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber. Safe to call once per process;
/// later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "corpus=debug,tower_http=debug,axum=info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
