//! Log output for the CLI.
//!
//! Human-readable `tracing` output on stderr, so stdout stays free for
//! command results. `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, before any events are emitted.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
