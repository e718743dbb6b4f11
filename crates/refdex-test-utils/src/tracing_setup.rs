//! Tracing helpers for tests.
//!
//! [`init_test_tracing`] routes events to the test harness writer;
//! [`capture_logs`] installs a thread-local [`LogCollector`] so a test can
//! assert on what retrieval logged.

use refdex_core::{LogCollector, LogReader};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialise a global subscriber that writes to the test-harness writer and
/// respects `RUST_LOG`. Subsequent calls are ignored.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Capture every event emitted on the current thread until the guard drops.
///
/// Use with `#[tokio::test]` (current-thread runtime) so spawned tasks log
/// on the same thread.
///
/// ```ignore
/// let (logs, _guard) = capture_logs();
/// retriever.verify(&index).await;
/// assert_eq!(logs.for_document("ghost").len(), 1);
/// ```
pub fn capture_logs() -> (LogReader, DefaultGuard) {
    let collector = LogCollector::new(1024);
    let reader = collector.reader();
    let guard = tracing_subscriber::registry().with(collector).set_default();
    (reader, guard)
}
