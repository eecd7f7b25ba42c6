//! Tracing/logging setup shared by the gateway binary and its tests.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Initialize with plain-text output captured by the test harness.
pub fn init_for_tests() {
    tracing::init_test_writer();
}

/// Subscriber configuration (filters, formatting).
pub mod tracing;
