//! Tracing subscriber bootstrap for binaries and tests.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber honoring `RUST_LOG`, defaulting to
/// `info`. Later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
