//! Tracing subscriber setup for the `tutor` and `tutor-proxy` binaries

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. Logs go to stderr so command
/// output on stdout stays clean. Calling twice is harmless.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        tracing::debug!("tracing already initialized: {}", err);
    }
}
