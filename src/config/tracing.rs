use tracing_forest::ForestLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Picks the configured filter, then `RUST_LOG`, then `info`.
pub fn env_filter(configured: Option<&str>) -> EnvFilter {
    configured
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

pub fn init(configured: Option<&str>) {
    tracing_subscriber::registry()
        .with(env_filter(configured))
        .with(ForestLayer::default())
        .init();
}
