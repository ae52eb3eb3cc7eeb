//! Anomaly Detector
//!
//! Scores each day against a trailing rolling baseline and reports only
//! sustained deviations: flagged days are grouped into calendar-consecutive
//! runs and runs shorter than `min_persist` are dropped as noise.

use crate::unify::{Metric, UnifiedRecord};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Rows in the trailing window, including the current day
    pub window: usize,
    /// Minimum |z| for a day to be flagged
    pub z_threshold: f64,
    /// Minimum run length to report
    pub min_persist: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: 30,
            z_threshold: 1.8,
            min_persist: 2,
        }
    }
}

impl AnomalyConfig {
    /// Observations needed in the window before a baseline exists
    pub fn min_periods(&self) -> usize {
        (self.window / 2).max(10)
    }
}

/// Rolling mean and sample standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub std: f64,
}

/// One day of a metric with its baseline and z-score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDay {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub baseline: Option<Baseline>,
    pub z: Option<f64>,
}

/// A sustained deviation from the rolling baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRun {
    pub metric: Metric,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Number of consecutive flagged days
    pub days: usize,
    /// Peak |z| within the run
    pub z_max: f64,
    /// Baseline as of the run's first day
    pub baseline_mean: f64,
    pub baseline_std: f64,
}

/// Trailing baselines over `window` rows ending at each row
///
/// Missing values do not count toward `min_periods`.
pub fn rolling_baseline(
    values: &[Option<f64>],
    window: usize,
    min_periods: usize,
) -> Vec<Option<Baseline>> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let present: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            if present.len() < min_periods.max(2) {
                return None;
            }

            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Some(Baseline {
                mean,
                std: variance.sqrt(),
            })
        })
        .collect()
}

/// Standard score, absent when the deviation is undefined
pub fn z_score(value: f64, baseline: Baseline) -> Option<f64> {
    if !baseline.std.is_finite() || baseline.std <= 0.0 {
        return None;
    }
    let z = (value - baseline.mean) / baseline.std;
    z.is_finite().then_some(z)
}

/// Score every day of `metric` in a date-sorted series
pub fn score(series: &[UnifiedRecord], metric: Metric, config: &AnomalyConfig) -> Vec<ScoredDay> {
    let values: Vec<Option<f64>> = series.iter().map(|r| r.value(metric)).collect();
    let baselines = rolling_baseline(&values, config.window, config.min_periods());

    series
        .iter()
        .zip(values)
        .zip(baselines)
        .map(|((record, value), baseline)| ScoredDay {
            date: record.date,
            value,
            baseline,
            z: value.zip(baseline).and_then(|(v, b)| z_score(v, b)),
        })
        .collect()
}

/// Fold date-sorted flagged days into runs of consecutive calendar dates
pub fn group_runs(flagged: &[ScoredDay]) -> Vec<Vec<ScoredDay>> {
    flagged.iter().fold(Vec::new(), |mut runs: Vec<Vec<ScoredDay>>, day| {
        let continues = runs
            .last()
            .and_then(|run| run.last())
            .is_some_and(|prev| day.date - prev.date == Duration::days(1));

        match runs.last_mut() {
            Some(run) if continues => run.push(*day),
            _ => runs.push(vec![*day]),
        }
        runs
    })
}

/// Detect persistent anomalies in one metric
pub fn detect(series: &[UnifiedRecord], metric: Metric, config: &AnomalyConfig) -> Vec<AnomalyRun> {
    let mut flagged: Vec<ScoredDay> = score(series, metric, config)
        .into_iter()
        .filter(|d| d.z.is_some_and(|z| z.abs() >= config.z_threshold))
        .collect();
    flagged.sort_by_key(|d| d.date);

    let runs: Vec<AnomalyRun> = group_runs(&flagged)
        .into_iter()
        .filter(|run| run.len() >= config.min_persist)
        .filter_map(|run| to_anomaly_run(metric, &run))
        .collect();

    tracing::debug!(
        metric = %metric,
        flagged_days = flagged.len(),
        runs = runs.len(),
        "Anomaly detection complete"
    );

    runs
}

fn to_anomaly_run(metric: Metric, run: &[ScoredDay]) -> Option<AnomalyRun> {
    let first = run.first()?;
    let last = run.last()?;
    let baseline = first.baseline?;
    let z_max = run
        .iter()
        .filter_map(|d| d.z)
        .map(f64::abs)
        .fold(0.0, f64::max);

    Some(AnomalyRun {
        metric,
        start_date: first.date,
        end_date: last.date,
        days: run.len(),
        z_max,
        baseline_mean: baseline.mean,
        baseline_std: baseline.std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unify::{DailyMetrics, UnifiedRecord, DEFAULT_USER_ID};
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn series(values: &[Option<f64>]) -> Vec<UnifiedRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| UnifiedRecord {
                date: day(i as i64),
                user_id: DEFAULT_USER_ID.to_string(),
                metrics: DailyMetrics {
                    resting_hr: *v,
                    ..Default::default()
                },
                provenance: BTreeMap::new(),
                sources_used: vec![],
                last_sync_iso: DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            })
            .collect()
    }

    /// Alternating 49/51 has mean 50 and a small, stable spread
    fn calm(n: usize) -> Vec<Option<f64>> {
        (0..n)
            .map(|i| Some(if i % 2 == 0 { 49.0 } else { 51.0 }))
            .collect()
    }

    fn scored(date: NaiveDate) -> ScoredDay {
        ScoredDay {
            date,
            value: Some(1.0),
            baseline: Some(Baseline { mean: 0.0, std: 1.0 }),
            z: Some(3.0),
        }
    }

    #[test]
    fn test_min_periods() {
        assert_eq!(AnomalyConfig::default().min_periods(), 15);
        let short = AnomalyConfig {
            window: 7,
            ..Default::default()
        };
        assert_eq!(short.min_periods(), 10);
    }

    #[test]
    fn test_z_score_scenario() {
        let z = z_score(65.0, Baseline { mean: 50.0, std: 5.0 }).unwrap();
        assert!((z - 3.0).abs() < 1e-12);
        assert!(z >= AnomalyConfig::default().z_threshold);
    }

    #[test]
    fn test_zero_std_gives_no_z() {
        assert_eq!(z_score(10.0, Baseline { mean: 10.0, std: 0.0 }), None);
        assert_eq!(z_score(10.0, Baseline { mean: 10.0, std: f64::NAN }), None);
    }

    #[test]
    fn test_no_baseline_before_min_periods() {
        let config = AnomalyConfig::default();
        let days = score(&series(&calm(40)), Metric::RestingHr, &config);

        for d in &days[..config.min_periods() - 1] {
            assert!(d.baseline.is_none());
            assert!(d.z.is_none());
        }
        assert!(days[config.min_periods() - 1].z.is_some());
    }

    #[test]
    fn test_missing_values_do_not_count() {
        let mut values = calm(20);
        for v in values.iter_mut().take(10) {
            *v = None;
        }
        let baselines = rolling_baseline(&values, 30, 15);
        assert!(baselines.iter().all(Option::is_none));
    }

    #[test]
    fn test_constant_series_never_flags() {
        let values = vec![Some(60.0); 40];
        let config = AnomalyConfig::default();
        assert!(detect(&series(&values), Metric::RestingHr, &config).is_empty());
    }

    #[test]
    fn test_group_runs_splits_on_gaps() {
        let flagged = vec![
            scored(day(0)),
            scored(day(1)),
            scored(day(3)),
            scored(day(5)),
            scored(day(6)),
            scored(day(7)),
        ];
        let runs = group_runs(&flagged);
        let lengths: Vec<usize> = runs.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2, 1, 3]);
        assert_eq!(runs[2][0].date, day(5));
    }

    #[test]
    fn test_group_runs_empty() {
        assert!(group_runs(&[]).is_empty());
    }

    #[test]
    fn test_sustained_spike_reported_with_exact_length() {
        let mut values = calm(30);
        values.extend([Some(80.0), Some(82.0), Some(81.0)]);
        values.extend(calm(5));

        let config = AnomalyConfig::default();
        let runs = detect(&series(&values), Metric::RestingHr, &config);

        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.metric, Metric::RestingHr);
        assert_eq!(run.start_date, day(30));
        assert_eq!(run.end_date, day(32));
        assert_eq!(run.days, 3);
        assert!(run.z_max >= config.z_threshold);
        assert!(run.baseline_mean > 50.0);
        assert!(run.baseline_std > 0.0);
    }

    #[test]
    fn test_single_day_spike_filtered() {
        let mut values = calm(30);
        values.push(Some(90.0));
        values.extend(calm(5));

        let config = AnomalyConfig::default();
        let scores = score(&series(&values), Metric::RestingHr, &config);
        assert!(scores[30].z.unwrap() >= config.z_threshold);

        assert!(detect(&series(&values), Metric::RestingHr, &config).is_empty());

        let lenient = AnomalyConfig {
            min_persist: 1,
            ..config
        };
        let runs = detect(&series(&values), Metric::RestingHr, &lenient);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].days, 1);
    }

    #[test]
    fn test_missing_metric_yields_nothing() {
        let values = vec![None; 40];
        assert!(detect(&series(&values), Metric::RestingHr, &AnomalyConfig::default()).is_empty());
    }
}
