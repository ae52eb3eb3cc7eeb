//! Source Routes
//!
//! - GET /v1/sources/status - Per-source sync summary and coverage

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::load_snapshot;
use crate::api::dto::RangeParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::unify::SourcesStatus;

/// GET /v1/sources/status
///
/// Status covers the whole merge window, which is at least 30 days.
pub async fn sources_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<SourcesStatus>> {
    let range_days = params.range_days()?;
    let snapshot = load_snapshot(&state, range_days).await?;
    Ok(Json(snapshot.status))
}
