//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use crate::analytics::InsightCard;
use crate::api::error::{ApiError, ApiResult};
use crate::services::{DomainRow, TimeSeries};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DEFAULT_RANGE_DAYS: usize = 30;
pub const RANGE_DAYS_LIMITS: RangeInclusive<usize> = 7..=180;

pub const DEFAULT_SEED_DAYS: usize = 90;
pub const SEED_DAYS_LIMITS: RangeInclusive<usize> = 14..=365;

fn within(name: &str, value: usize, limits: RangeInclusive<usize>) -> ApiResult<usize> {
    if limits.contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::Validation(format!(
            "{} must be between {} and {}",
            name,
            limits.start(),
            limits.end()
        )))
    }
}

// ============================================
// REQUEST PARAMS
// ============================================

/// `?range_days=` on dashboard, insight and status routes
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub range_days: Option<usize>,
}

impl RangeParams {
    pub fn range_days(&self) -> ApiResult<usize> {
        within(
            "range_days",
            self.range_days.unwrap_or(DEFAULT_RANGE_DAYS),
            RANGE_DAYS_LIMITS,
        )
    }
}

/// `?days=` on the seed route
#[derive(Debug, Default, Deserialize)]
pub struct SeedParams {
    pub days: Option<usize>,
}

impl SeedParams {
    pub fn days(&self) -> ApiResult<usize> {
        within("days", self.days.unwrap_or(DEFAULT_SEED_DAYS), SEED_DAYS_LIMITS)
    }
}

// ============================================
// RESPONSES
// ============================================

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub ok: bool,
    pub data_path: String,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesResponse {
    pub series: TimeSeries,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<InsightCard>,
}

#[derive(Debug, Serialize)]
pub struct DomainResponse {
    pub domain: String,
    pub rows: Vec<DomainRow>,
}

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
