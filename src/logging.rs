//! Tracing setup for the binary.
//!
//! Logs go to stderr so stdout carries only markup. Filter with `RUST_LOG`:
//! - `RUST_LOG=debug` - everything, including grammar conversion details
//! - `RUST_LOG=moonlight::handshake=debug` - just the readiness handshake

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install the console subscriber. `quiet` drops the default to `warn`.
pub fn init(quiet: bool) {
    let fallback = if quiet { "warn" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
