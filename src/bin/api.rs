//! WellSync API Server
//!
//! Run with: cargo run --bin wellsync-api
//!
//! # Configuration
//!
//! Read from the standard config locations (see `wellsync config`), then
//! overridden by environment variables:
//! - `WELLSYNC_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `WELLSYNC_API_PORT`: Port to listen on (default: 8000)
//! - `WELLSYNC_DATA_PATH`: Demo snapshot CSV
//! - `WELLSYNC_LOG_LEVEL`, `WELLSYNC_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Full filter, wins over the configured level

use wellsync::api::{serve, AppState};
use wellsync::config::Config;
use wellsync::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting WellSync API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Demo snapshot: {:?}", config.data.path);
    tracing::info!(
        window = config.analytics.window,
        z_threshold = config.analytics.z_threshold,
        min_persist = config.analytics.min_persist,
        "Anomaly detector configured"
    );

    let state = AppState::from_config(&config);

    // Snapshot must exist before the first request
    let registry = state.registry.clone();
    tokio::task::spawn_blocking(move || registry.ensure_snapshot()).await??;

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("WellSync API server stopped");
    Ok(())
}
