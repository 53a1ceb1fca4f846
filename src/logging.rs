//! Log subscriber setup.
//!
//! The library itself only emits `tracing` events. These helpers install a
//! `fmt` subscriber for binaries and tests that do not bring their own.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();
static INIT_TEST_LOGGING: Once = Once::new();

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (default `INFO`) applies to
/// everything. Calling it again, or after another subscriber was installed,
/// does nothing.
pub fn init(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(Level::INFO).to_string()));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}

/// Initialize logging for tests.
///
/// Silent unless `level` is given or `RUST_LOG` is set:
///
/// ```bash
/// RUST_LOG=wirebean=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_TEST_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
