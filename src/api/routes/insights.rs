//! Insight Routes
//!
//! - GET /v1/insights - Correlation and anomaly cards for the range

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::load_snapshot;
use crate::api::dto::{InsightsResponse, RangeParams};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /v1/insights
///
/// Cards are recomputed from the unified series on every call.
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<InsightsResponse>> {
    let range_days = params.range_days()?;
    let snapshot = load_snapshot(&state, range_days).await?;

    let insights = state.composer.compose(&snapshot.records);
    tracing::info!(range_days, cards = insights.len(), "Generated insights");

    Ok(Json(InsightsResponse { insights }))
}
