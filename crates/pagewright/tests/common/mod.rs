// Shared helpers for integration tests

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to warnings only.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
