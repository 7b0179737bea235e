//! Logging initialization for the agent.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// The level comes from `RUST_LOG` when set, otherwise from the provided
/// default. Output goes to stderr so operator-facing output on stdout
/// stays readable.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
