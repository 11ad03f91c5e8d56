//! Tracing initialization for the runner binary and for tests.

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default filter applied when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVE: &str = "info";

static TEST_TRACING: Once = Once::new();

/// Initializes tracing for a service binary.
///
/// Respects `RUST_LOG` and falls back to info level. The `service` name is
/// attached to the startup event for log correlation.
pub fn init_tracing(service: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::util::SubscriberInitExt;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish()
        .try_init()?;

    info!(service, "tracing initialized");

    Ok(())
}

/// Initializes tracing for tests.
///
/// Safe to call from every test; initialization happens once and output is
/// routed through the test writer so it interleaves with test output.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}
