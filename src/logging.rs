//! Console logging setup using `tracing-subscriber`.
//!
//! Library code only emits `tracing` events; a host binary calls
//! [`init`] once at startup to get human-readable stderr output.

use tracing_subscriber::EnvFilter;

/// Initialise console logging.
///
/// Respects `RUST_LOG`; without it the filter defaults to `info`, or
/// `info,rtmbridge=debug` when `debug` is set — the same option that
/// asks the wire client for protocol-level logging.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init(debug: bool) {
    let default_filter = if debug { "info,rtmbridge=debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
