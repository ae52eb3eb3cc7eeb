//! Domain Routes
//!
//! - GET /v1/domains/:name - Unified rows projected onto one domain

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::load_snapshot;
use crate::api::dto::{DomainResponse, RangeParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::services::{domain_view, Domain};

/// GET /v1/domains/:name
pub async fn get_domain(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<DomainResponse>> {
    let domain: Domain = name.parse().map_err(ApiError::NotFound)?;
    let range_days = params.range_days()?;
    let snapshot = load_snapshot(&state, range_days).await?;

    Ok(Json(DomainResponse {
        domain: domain.to_string(),
        rows: domain_view(&snapshot.records, domain),
    }))
}
