//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, otherwise from the configuration
pub fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber; logs go to stderr so stdout stays clean
pub fn init(configured: &str) {
    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
