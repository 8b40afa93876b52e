//! Tracing subscriber setup for host applications.
//!
//! The session core logs through `tracing` (connection lifecycle at
//! info, dispatch at debug, anomalies at warn); the embedding UI decides
//! where that output goes. This helper is the stderr default.

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` overrides `level` when set.
///
/// # Arguments
///
/// * `level` - Minimum log level to display. `"warn"` is a sensible
///   default for embedding UIs.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a subscriber is already set
    let _ = subscriber.try_init();
}
