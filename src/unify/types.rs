//! Core data types for the unification pipeline
//!
//! - `Metric`: the closed set of daily wellness metrics
//! - `DailyMetrics`: one optional value per metric
//! - `NormalizedDailyRecord`: one day as reported by one source
//! - `UnifiedRecord`: one day reconciled across every source
//! - `SourcesStatus`: per-source and per-coverage-group summary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// User id assigned when a source does not report one
pub const DEFAULT_USER_ID: &str = "demo_user";

/// A daily wellness metric recognized by the normalizer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SleepHours,
    Steps,
    ActiveMinutes,
    Calories,
    SugarG,
    ProteinG,
    CarbsG,
    FatG,
    RestingHr,
}

/// Numeric representation of a metric's values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Whole counts (steps, minutes, calories)
    Integer,
    /// Measured quantities (hours, grams, bpm)
    Float,
}

impl Metric {
    /// Every metric, in column order
    pub const ALL: [Metric; 9] = [
        Metric::SleepHours,
        Metric::Steps,
        Metric::ActiveMinutes,
        Metric::Calories,
        Metric::SugarG,
        Metric::ProteinG,
        Metric::CarbsG,
        Metric::FatG,
        Metric::RestingHr,
    ];

    /// Column name used in tables and JSON
    pub fn column(&self) -> &'static str {
        match self {
            Metric::SleepHours => "sleep_hours",
            Metric::Steps => "steps",
            Metric::ActiveMinutes => "active_minutes",
            Metric::Calories => "calories",
            Metric::SugarG => "sugar_g",
            Metric::ProteinG => "protein_g",
            Metric::CarbsG => "carbs_g",
            Metric::FatG => "fat_g",
            Metric::RestingHr => "resting_hr",
        }
    }

    /// Human-readable label for cards and tables
    pub fn label(&self) -> &'static str {
        match self {
            Metric::SleepHours => "Sleep (hours)",
            Metric::Steps => "Steps",
            Metric::ActiveMinutes => "Active Minutes",
            Metric::Calories => "Calories",
            Metric::SugarG => "Sugar (g)",
            Metric::ProteinG => "Protein (g)",
            Metric::CarbsG => "Carbs (g)",
            Metric::FatG => "Fat (g)",
            Metric::RestingHr => "Resting HR",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Steps | Metric::ActiveMinutes | Metric::Calories => MetricKind::Integer,
            _ => MetricKind::Float,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.column() == s.trim())
            .ok_or_else(|| format!("unknown metric: {}", s))
    }
}

/// One optional value per metric
///
/// Absent means "not measured"; a present value is always finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub sleep_hours: Option<f64>,
    pub steps: Option<i64>,
    pub active_minutes: Option<i64>,
    pub calories: Option<i64>,
    pub sugar_g: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub resting_hr: Option<f64>,
}

impl DailyMetrics {
    /// Read a metric as a float, regardless of its storage kind
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SleepHours => self.sleep_hours,
            Metric::Steps => self.steps.map(|v| v as f64),
            Metric::ActiveMinutes => self.active_minutes.map(|v| v as f64),
            Metric::Calories => self.calories.map(|v| v as f64),
            Metric::SugarG => self.sugar_g,
            Metric::ProteinG => self.protein_g,
            Metric::CarbsG => self.carbs_g,
            Metric::FatG => self.fat_g,
            Metric::RestingHr => self.resting_hr,
        }
    }

    pub fn has(&self, metric: Metric) -> bool {
        self.get(metric).is_some()
    }

    /// Copy one metric from `other`, keeping its storage kind
    pub fn copy_metric(&mut self, metric: Metric, other: &DailyMetrics) {
        match metric {
            Metric::SleepHours => self.sleep_hours = other.sleep_hours,
            Metric::Steps => self.steps = other.steps,
            Metric::ActiveMinutes => self.active_minutes = other.active_minutes,
            Metric::Calories => self.calories = other.calories,
            Metric::SugarG => self.sugar_g = other.sugar_g,
            Metric::ProteinG => self.protein_g = other.protein_g,
            Metric::CarbsG => self.carbs_g = other.carbs_g,
            Metric::FatG => self.fat_g = other.fat_g,
            Metric::RestingHr => self.resting_hr = other.resting_hr,
        }
    }

    /// Set an integer-kind metric. Float metrics receive the value as f64.
    pub fn set_int(&mut self, metric: Metric, value: Option<i64>) {
        match metric {
            Metric::Steps => self.steps = value,
            Metric::ActiveMinutes => self.active_minutes = value,
            Metric::Calories => self.calories = value,
            other => self.set_float(other, value.map(|v| v as f64)),
        }
    }

    /// Set a float-kind metric. Integer metrics truncate; non-finite values are dropped.
    pub fn set_float(&mut self, metric: Metric, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        match metric {
            Metric::SleepHours => self.sleep_hours = value,
            Metric::Steps => self.steps = value.map(|v| v.trunc() as i64),
            Metric::ActiveMinutes => self.active_minutes = value.map(|v| v.trunc() as i64),
            Metric::Calories => self.calories = value.map(|v| v.trunc() as i64),
            Metric::SugarG => self.sugar_g = value,
            Metric::ProteinG => self.protein_g = value,
            Metric::CarbsG => self.carbs_g = value,
            Metric::FatG => self.fat_g = value,
            Metric::RestingHr => self.resting_hr = value,
        }
    }

    /// True when no metric is present
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| !self.has(*m))
    }
}

/// One day of data as reported by a single source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDailyRecord {
    pub date: NaiveDate,
    pub user_id: String,
    #[serde(flatten)]
    pub metrics: DailyMetrics,
    /// Sources behind this record (exactly one after normalization)
    pub sources_used: Vec<String>,
    /// When the record was normalized, UTC, second precision
    pub last_sync_iso: DateTime<Utc>,
}

impl NormalizedDailyRecord {
    pub fn new(date: NaiveDate, source: impl Into<String>, synced_at: DateTime<Utc>) -> Self {
        Self {
            date,
            user_id: DEFAULT_USER_ID.to_string(),
            metrics: DailyMetrics::default(),
            sources_used: vec![source.into()],
            last_sync_iso: synced_at,
        }
    }

    /// Builder method: set a metric value
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.metrics.set_float(metric, Some(value));
        self
    }

    /// Builder method: set the user id
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

/// One day reconciled across every contributing source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedRecord {
    pub date: NaiveDate,
    pub user_id: String,
    #[serde(flatten)]
    pub metrics: DailyMetrics,
    /// Winning source per metric, `None` when no source had a value
    pub provenance: BTreeMap<Metric, Option<String>>,
    /// Sources with any data for this date, in priority order
    pub sources_used: Vec<String>,
    pub last_sync_iso: DateTime<Utc>,
}

impl UnifiedRecord {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }

    /// Source the metric was taken from
    pub fn source_of(&self, metric: Metric) -> Option<&str> {
        self.provenance.get(&metric).and_then(|s| s.as_deref())
    }
}

/// Connection summary for one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStatus {
    pub connected: bool,
    /// Distinct dates this source contributed
    pub days: usize,
    pub last_sync_iso: Option<DateTime<Utc>>,
}

/// How many unified days carry every metric of a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageStat {
    pub covered_days: usize,
    pub total_days: usize,
    /// Percentage rounded to one decimal, 0.0 for an empty series
    pub pct: f64,
}

impl CoverageStat {
    pub fn new(covered_days: usize, total_days: usize) -> Self {
        let pct = if total_days == 0 {
            0.0
        } else {
            (covered_days as f64 / total_days as f64 * 1000.0).round() / 10.0
        };
        Self {
            covered_days,
            total_days,
            pct,
        }
    }
}

/// Status summary produced alongside the unified series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourcesStatus {
    pub sources: BTreeMap<String, SourceStatus>,
    pub coverage: BTreeMap<String, CoverageStat>,
    pub last_sync_iso: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_columns_round_trip_through_from_str() {
        for metric in Metric::ALL {
            assert_eq!(metric.column().parse::<Metric>().unwrap(), metric);
        }
        assert!("mood".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_serializes_as_column_name() {
        let json = serde_json::to_string(&Metric::RestingHr).unwrap();
        assert_eq!(json, "\"resting_hr\"");
        let json = serde_json::to_string(&Metric::SugarG).unwrap();
        assert_eq!(json, "\"sugar_g\"");
    }

    #[test]
    fn test_daily_metrics_integer_kind_truncates() {
        let mut metrics = DailyMetrics::default();
        metrics.set_float(Metric::Steps, Some(8123.9));
        assert_eq!(metrics.steps, Some(8123));
        assert_eq!(metrics.get(Metric::Steps), Some(8123.0));
    }

    #[test]
    fn test_daily_metrics_drops_non_finite() {
        let mut metrics = DailyMetrics::default();
        metrics.set_float(Metric::SleepHours, Some(f64::NAN));
        metrics.set_float(Metric::Calories, Some(f64::INFINITY));
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_coverage_pct_rounding() {
        let stat = CoverageStat::new(2, 3);
        assert_eq!(stat.pct, 66.7);
        assert_eq!(CoverageStat::new(0, 0).pct, 0.0);
        assert_eq!(CoverageStat::new(5, 5).pct, 100.0);
    }

    #[test]
    fn test_unified_record_serializes_flat() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let synced = DateTime::parse_from_rfc3339("2024-01-15T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = UnifiedRecord {
            date,
            user_id: DEFAULT_USER_ID.to_string(),
            metrics: DailyMetrics {
                sleep_hours: Some(7.5),
                ..Default::default()
            },
            provenance: BTreeMap::from([(Metric::SleepHours, Some("Apple Health".to_string()))]),
            sources_used: vec!["Apple Health".to_string()],
            last_sync_iso: synced,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-01-15");
        assert_eq!(json["sleep_hours"], 7.5);
        assert!(json["steps"].is_null());
        assert_eq!(json["provenance"]["sleep_hours"], "Apple Health");
        assert_eq!(json["last_sync_iso"], "2024-01-15T08:00:00Z");
    }
}
