//! Dashboard Routes
//!
//! - GET /v1/dashboard/summary - Headline averages over the range
//! - GET /v1/dashboard/timeseries - Column-oriented chart data

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::load_snapshot;
use crate::api::dto::{RangeParams, TimeSeriesResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::services::{kpi_summary, to_timeseries, KpiSummary};

/// GET /v1/dashboard/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<KpiSummary>> {
    let range_days = params.range_days()?;
    let snapshot = load_snapshot(&state, range_days).await?;
    Ok(Json(kpi_summary(&snapshot.records)))
}

/// GET /v1/dashboard/timeseries
pub async fn timeseries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<TimeSeriesResponse>> {
    let range_days = params.range_days()?;
    let snapshot = load_snapshot(&state, range_days).await?;
    Ok(Json(TimeSeriesResponse {
        series: to_timeseries(&snapshot.records),
    }))
}
