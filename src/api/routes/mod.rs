//! API Routes
//!
//! Route handlers organized by functionality.

pub mod dashboard;
pub mod demo;
pub mod domains;
pub mod health;
pub mod insights;
pub mod sources;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::services::UnifiedSnapshot;
use std::sync::Arc;

/// Run the snapshot pipeline on the blocking pool
pub(crate) async fn load_snapshot(state: &AppState, range_days: usize) -> ApiResult<UnifiedSnapshot> {
    let registry = Arc::clone(&state.registry);
    tokio::task::spawn_blocking(move || registry.load_unified(range_days))
        .await
        .map_err(|e| ApiError::Internal(format!("Pipeline task failed: {}", e)))?
        .map_err(ApiError::from)
}
