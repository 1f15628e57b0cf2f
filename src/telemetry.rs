//! Tracing subscriber initialisation.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// more than once leaves the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).try_init().ok();
}
