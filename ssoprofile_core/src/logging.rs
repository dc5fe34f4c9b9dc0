//! Logging utilities. Log lines go to stderr so stdout stays free for
//! command output.
//!

// Re-exports for convenience
pub use tracing::metadata::LevelFilter;
pub use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{util::SubscriberInitExt, Layer};

/// Set up basic logging
pub fn setup(level: Option<LevelFilter>) {
    // The user can specify a log level via an env var
    // (such as for testing).
    let env = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "ssoprofile_core=debug,ssoprofile_lib=debug".into());
    let mut logging_layers = vec![tracing_subscriber::EnvFilter::new(env).boxed()];

    // The input level overrides any env vars.
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(level.unwrap_or(LevelFilter::INFO))
        .boxed();
    logging_layers.push(layer);

    // A second call (e.g. from tests) leaves the first subscriber in place.
    if tracing_subscriber::registry()
        .with(logging_layers)
        .try_init()
        .is_ok()
    {
        debug!("logging set up");
    }
}
