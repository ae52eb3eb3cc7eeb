//! Dashboard projections over a unified series

use crate::unify::{Metric, UnifiedRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Headline averages, absent when a metric has no values in range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub avg_sleep_hours: Option<f64>,
    pub avg_steps: Option<i64>,
    pub avg_calories: Option<i64>,
    pub avg_sugar_g: Option<f64>,
}

fn mean(records: &[UnifiedRecord], metric: Metric) -> Option<f64> {
    let values: Vec<f64> = records.iter().filter_map(|r| r.value(metric)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn rounded(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn kpi_summary(records: &[UnifiedRecord]) -> KpiSummary {
    KpiSummary {
        avg_sleep_hours: mean(records, Metric::SleepHours).map(|v| rounded(v, 2)),
        avg_steps: mean(records, Metric::Steps).map(|v| v.trunc() as i64),
        avg_calories: mean(records, Metric::Calories).map(|v| v.trunc() as i64),
        avg_sugar_g: mean(records, Metric::SugarG).map(|v| rounded(v, 1)),
    }
}

/// Metrics charted on the dashboard, in column order
pub const TIMESERIES_METRICS: [Metric; 6] = [
    Metric::SleepHours,
    Metric::Steps,
    Metric::ActiveMinutes,
    Metric::Calories,
    Metric::SugarG,
    Metric::RestingHr,
];

/// Column-oriented series; every column has one entry per date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub date: Vec<NaiveDate>,
    #[serde(flatten)]
    pub columns: BTreeMap<Metric, Vec<Option<f64>>>,
}

pub fn to_timeseries(records: &[UnifiedRecord]) -> TimeSeries {
    TimeSeries {
        date: records.iter().map(|r| r.date).collect(),
        columns: TIMESERIES_METRICS
            .iter()
            .map(|&m| (m, records.iter().map(|r| r.value(m)).collect()))
            .collect(),
    }
}

/// A wellness area and the unified columns it owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Sleep,
    Activity,
    Nutrition,
    Vitals,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Sleep,
        Domain::Activity,
        Domain::Nutrition,
        Domain::Vitals,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Domain::Sleep => "sleep",
            Domain::Activity => "activity",
            Domain::Nutrition => "nutrition",
            Domain::Vitals => "vitals",
        }
    }

    pub fn columns(&self) -> &'static [Metric] {
        match self {
            Domain::Sleep => &[Metric::SleepHours],
            Domain::Activity => &[Metric::Steps, Metric::ActiveMinutes],
            Domain::Nutrition => &[
                Metric::Calories,
                Metric::SugarG,
                Metric::ProteinG,
                Metric::CarbsG,
                Metric::FatG,
            ],
            Domain::Vitals => &[Metric::RestingHr],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown domain '{}'", s))
    }
}

/// One date projected onto a domain's columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<Metric, Option<f64>>,
}

pub fn domain_view(records: &[UnifiedRecord], domain: Domain) -> Vec<DomainRow> {
    records
        .iter()
        .map(|r| DomainRow {
            date: r.date,
            values: domain.columns().iter().map(|&m| (m, r.value(m))).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unify::{DailyMetrics, DEFAULT_USER_ID};
    use chrono::{DateTime, Duration, Utc};

    fn record(offset: i64, metrics: DailyMetrics) -> UnifiedRecord {
        UnifiedRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + Duration::days(offset),
            user_id: DEFAULT_USER_ID.to_string(),
            metrics,
            provenance: BTreeMap::new(),
            sources_used: vec!["Apple Health".to_string()],
            last_sync_iso: DateTime::parse_from_rfc3339("2024-05-10T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn sample() -> Vec<UnifiedRecord> {
        vec![
            record(
                0,
                DailyMetrics {
                    sleep_hours: Some(7.25),
                    steps: Some(8001),
                    calories: Some(2100),
                    sugar_g: Some(40.04),
                    ..Default::default()
                },
            ),
            record(
                1,
                DailyMetrics {
                    sleep_hours: Some(6.5),
                    steps: Some(9000),
                    calories: Some(2300),
                    ..Default::default()
                },
            ),
            record(
                2,
                DailyMetrics {
                    sleep_hours: None,
                    steps: Some(7000),
                    calories: Some(1901),
                    sugar_g: Some(52.1),
                    ..Default::default()
                },
            ),
        ]
    }

    #[test]
    fn test_kpi_summary() {
        let kpi = kpi_summary(&sample());
        assert_eq!(kpi.avg_sleep_hours, Some(6.88));
        assert_eq!(kpi.avg_steps, Some(8000));
        assert_eq!(kpi.avg_calories, Some(2100));
        assert_eq!(kpi.avg_sugar_g, Some(46.1));
    }

    #[test]
    fn test_kpi_integer_averages_truncate() {
        let records = vec![
            record(
                0,
                DailyMetrics {
                    steps: Some(8000),
                    calories: Some(2000),
                    sleep_hours: Some(7.0),
                    ..Default::default()
                },
            ),
            record(
                1,
                DailyMetrics {
                    steps: Some(8001),
                    calories: Some(2001),
                    sleep_hours: Some(7.005),
                    ..Default::default()
                },
            ),
        ];
        let kpi = kpi_summary(&records);
        assert_eq!(kpi.avg_steps, Some(8000));
        assert_eq!(kpi.avg_calories, Some(2000));
        assert_eq!(kpi.avg_sleep_hours, Some(7.0));
    }

    #[test]
    fn test_kpi_summary_empty() {
        let kpi = kpi_summary(&[]);
        assert_eq!(kpi.avg_sleep_hours, None);
        assert_eq!(kpi.avg_steps, None);
    }

    #[test]
    fn test_timeseries_keeps_gaps() {
        let ts = to_timeseries(&sample());
        assert_eq!(ts.date.len(), 3);
        assert_eq!(ts.columns.len(), TIMESERIES_METRICS.len());
        assert_eq!(ts.columns[&Metric::SleepHours], vec![Some(7.25), Some(6.5), None]);
        assert_eq!(ts.columns[&Metric::RestingHr], vec![None, None, None]);

        let json = serde_json::to_value(&ts).unwrap();
        assert_eq!(json["date"][0], "2024-05-01");
        assert_eq!(json["steps"][1], 9000.0);
        assert!(json["sugar_g"][1].is_null());
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("sleep".parse::<Domain>().unwrap(), Domain::Sleep);
        assert_eq!("Vitals".parse::<Domain>().unwrap(), Domain::Vitals);
        assert!("mood".parse::<Domain>().is_err());
    }

    #[test]
    fn test_domain_view_projects_columns() {
        let rows = domain_view(&sample(), Domain::Activity);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].values.len(), 2);
        assert_eq!(rows[0].values[&Metric::Steps], Some(8001.0));
        assert_eq!(rows[0].values[&Metric::ActiveMinutes], None);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["date"], "2024-05-01");
        assert!(json.get("sleep_hours").is_none());
    }
}
