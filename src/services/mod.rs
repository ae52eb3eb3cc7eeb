//! Service Registry
//!
//! Reads the demo snapshot, carves it into three simulated providers with
//! their own gaps, and runs them through normalization and merging. Nothing
//! is cached: every call recomputes from the snapshot file.

mod views;

pub use views::{
    domain_view, kpi_summary, to_timeseries, Domain, DomainRow, KpiSummary, TimeSeries,
    TIMESERIES_METRICS,
};

use crate::config::DataConfig;
use crate::demo::{ensure_demo_data, seed_demo_data, DemoError};
use crate::unify::{
    ingest, merge_by_date, sync_timestamp, RawTable, SourceBatch, SourcesStatus, UnifiedRecord,
    UnifyError, UnifyResult, APPLE_HEALTH, GOOGLE_FIT, MY_FITNESS_PAL,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rows read from the snapshot before merging, whatever the requested range
pub const MIN_LOOKBACK_DAYS: usize = 30;

const GOOGLE_FIT_STEPS_GAP: usize = 6;
const MY_FITNESS_PAL_SUGAR_GAP: usize = 5;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Demo(#[from] DemoError),

    #[error(transparent)]
    Unify(#[from] UnifyError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// A unified window and the status of the merge it was cut from
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedSnapshot {
    pub records: Vec<UnifiedRecord>,
    pub status: SourcesStatus,
}

/// Entry point for everything backed by the demo snapshot
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    data: DataConfig,
}

impl ServiceRegistry {
    pub fn new(data: DataConfig) -> Self {
        Self { data }
    }

    pub fn data_path(&self) -> &Path {
        &self.data.path
    }

    /// Create the snapshot with the configured size if it is missing
    pub fn ensure_snapshot(&self) -> ServiceResult<PathBuf> {
        Ok(ensure_demo_data(
            &self.data.path,
            self.data.demo_days,
            self.data.seed,
        )?)
    }

    /// Regenerate the snapshot with `days` of history
    pub fn seed(&self, days: usize) -> ServiceResult<PathBuf> {
        Ok(seed_demo_data(&self.data.path, days, self.data.seed)?)
    }

    /// Unified series for the last `range_days` days of the snapshot
    pub fn load_unified(&self, range_days: usize) -> ServiceResult<UnifiedSnapshot> {
        let path = self.ensure_snapshot()?;
        let table = RawTable::from_csv_path(&path)?;
        Ok(unify_table(&table, range_days, sync_timestamp())?)
    }
}

/// Run a snapshot table through the simulated providers and the merger
pub fn unify_table(
    table: &RawTable,
    range_days: usize,
    synced_at: DateTime<Utc>,
) -> UnifyResult<UnifiedSnapshot> {
    let window = table
        .sorted_by_date()?
        .tail(range_days.max(MIN_LOOKBACK_DAYS));

    let batches = simulate_sources(&window, synced_at)?;
    let merged = merge_by_date(&batches);

    let start = merged.records.len().saturating_sub(range_days);
    let records = merged.records[start..].to_vec();

    tracing::debug!(
        snapshot_rows = table.len(),
        merged_days = merged.records.len(),
        returned_days = records.len(),
        "Unified snapshot window"
    );

    Ok(UnifiedSnapshot {
        records,
        status: merged.status,
    })
}

/// Split one table into the three provider feeds, in priority order
pub fn simulate_sources(table: &RawTable, synced_at: DateTime<Utc>) -> UnifyResult<Vec<SourceBatch>> {
    let apple = table.select(&[
        "date",
        "user_id",
        "sleep_hours",
        "steps",
        "active_minutes",
        "resting_hr",
    ]);

    let mut google = table.select(&["date", "user_id", "steps", "active_minutes"]);
    google.blank_every_nth("steps", GOOGLE_FIT_STEPS_GAP);

    let mut mfp = table.select(&[
        "date",
        "user_id",
        "calories",
        "sugar_g",
        "protein_g",
        "carbs_g",
        "fat_g",
    ]);
    mfp.blank_every_nth("sugar_g", MY_FITNESS_PAL_SUGAR_GAP);

    Ok(vec![
        SourceBatch::new(APPLE_HEALTH.name, ingest(&apple, &APPLE_HEALTH, synced_at)?),
        SourceBatch::new(GOOGLE_FIT.name, ingest(&google, &GOOGLE_FIT, synced_at)?),
        SourceBatch::new(MY_FITNESS_PAL.name, ingest(&mfp, &MY_FITNESS_PAL, synced_at)?),
    ])
}
