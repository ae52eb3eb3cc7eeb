//! Record Normalizer
//!
//! Turns a provider's raw table into `NormalizedDailyRecord`s. Dates are
//! strict; metric cells are lenient and become absent when they do not parse.

use super::error::{UnifyError, UnifyResult};
use super::table::RawTable;
use super::types::{Metric, MetricKind, NormalizedDailyRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

/// A data provider and the metric columns it reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSpec {
    pub name: &'static str,
    pub metrics: &'static [Metric],
}

pub const APPLE_HEALTH: SourceSpec = SourceSpec {
    name: "Apple Health",
    metrics: &[
        Metric::SleepHours,
        Metric::Steps,
        Metric::ActiveMinutes,
        Metric::RestingHr,
    ],
};

pub const GOOGLE_FIT: SourceSpec = SourceSpec {
    name: "Google Fit",
    metrics: &[Metric::Steps, Metric::ActiveMinutes, Metric::SleepHours],
};

pub const MY_FITNESS_PAL: SourceSpec = SourceSpec {
    name: "MyFitnessPal",
    metrics: &[
        Metric::Calories,
        Metric::SugarG,
        Metric::ProteinG,
        Metric::CarbsG,
        Metric::FatG,
    ],
};

/// Current time truncated to whole seconds
pub fn sync_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Parse a calendar date, accepting a trailing time component
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

fn coerce_float(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn coerce_int(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    cell.parse::<i64>()
        .ok()
        .or_else(|| coerce_float(cell).map(|v| v.trunc() as i64))
}

/// Normalize every recognized metric column of `table` under `source`
pub fn normalize(
    table: &RawTable,
    source: &str,
    synced_at: DateTime<Utc>,
) -> UnifyResult<Vec<NormalizedDailyRecord>> {
    normalize_columns(table, source, &Metric::ALL, synced_at)
}

/// Normalize only the columns a provider reports
pub fn ingest(
    table: &RawTable,
    spec: &SourceSpec,
    synced_at: DateTime<Utc>,
) -> UnifyResult<Vec<NormalizedDailyRecord>> {
    normalize_columns(table, spec.name, spec.metrics, synced_at)
}

fn normalize_columns(
    table: &RawTable,
    source: &str,
    metrics: &[Metric],
    synced_at: DateTime<Utc>,
) -> UnifyResult<Vec<NormalizedDailyRecord>> {
    if !table.has_column("date") {
        return Err(UnifyError::malformed(0, "missing 'date' column"));
    }

    let mut records = Vec::with_capacity(table.len());

    for (row_num, row) in table.rows().enumerate() {
        let raw_date = row.get("date").unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| {
            UnifyError::malformed(row_num, format!("could not parse date '{}'", raw_date))
        })?;

        let mut record = NormalizedDailyRecord::new(date, source, synced_at);

        if let Some(user_id) = row.get("user_id").filter(|u| !u.is_empty()) {
            record.user_id = user_id.to_string();
        }

        for &metric in metrics {
            let Some(cell) = row.get(metric.column()) else {
                continue;
            };
            match metric.kind() {
                MetricKind::Integer => record.metrics.set_int(metric, coerce_int(cell)),
                MetricKind::Float => record.metrics.set_float(metric, coerce_float(cell)),
            }
        }

        records.push(record);
    }

    tracing::debug!(
        source = %source,
        records = records.len(),
        "Normalized source table"
    );

    Ok(records)
}
