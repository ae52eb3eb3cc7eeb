//! WellSync REST API
//!
//! HTTP API layer for WellSync, built with Axum.
//!
//! # Endpoints
//!
//! ## Demo
//! - `POST /v1/demo/seed?days=90` - Regenerate the demo snapshot
//!
//! ## Dashboard
//! - `GET /v1/dashboard/summary?range_days=30` - KPI averages
//! - `GET /v1/dashboard/timeseries?range_days=30` - Chart series
//!
//! ## Insights
//! - `GET /v1/insights?range_days=30` - Correlation and anomaly cards
//!
//! ## Sources
//! - `GET /v1/sources/status?range_days=30` - Sync status and coverage
//! - `GET /v1/domains/:name?range_days=30` - Per-domain rows
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Version and uptime
//!
//! # Example
//!
//! ```rust,ignore
//! use wellsync::api::{serve, AppState};
//! use wellsync::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     serve(AppState::from_config(&config), &config.api).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use crate::config::ApiConfig;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route("/demo/seed", post(routes::demo::seed))
        .route("/dashboard/summary", get(routes::dashboard::summary))
        .route("/dashboard/timeseries", get(routes::dashboard::timeseries))
        .route("/insights", get(routes::insights::list_insights))
        .route("/sources/status", get(routes::sources::sources_status))
        .route("/domains/:name", get(routes::domains::get_domain));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Allow the configured origins, or any origin when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("WellSync API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("WellSync API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
