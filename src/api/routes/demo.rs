//! Demo Routes
//!
//! - POST /v1/demo/seed - Regenerate the demo snapshot

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{SeedParams, SeedResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /v1/demo/seed
pub async fn seed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeedParams>,
) -> ApiResult<Json<SeedResponse>> {
    let days = params.days()?;

    let registry = Arc::clone(&state.registry);
    let path = tokio::task::spawn_blocking(move || registry.seed(days))
        .await
        .map_err(|e| ApiError::Internal(format!("Seed task failed: {}", e)))??;

    tracing::info!(days, path = ?path, "Seeded demo snapshot");

    Ok(Json(SeedResponse {
        ok: true,
        data_path: path.to_string_lossy().to_string(),
    }))
}
