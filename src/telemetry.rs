//! Tracing subscriber setup for hosts that do not install their own

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "expo_floorplan=info";

/// Install a fmt subscriber filtered by `RUST_LOG`. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
