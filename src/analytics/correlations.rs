//! Correlation Engine
//!
//! Calculates Spearman and Pearson coefficients between metric pairs of the
//! unified series, optionally with the y metric shifted forward in time.
//! Spearman drives strength and direction; Pearson is reported alongside.

use crate::unify::{Metric, UnifiedRecord};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Complete observations required before a pair is reported
pub const MIN_SAMPLES: usize = 10;

/// Magnitude bucket of a Spearman coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    None,
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    pub fn from_coefficient(r: f64) -> Self {
        let abs_r = r.abs();
        if abs_r >= 0.6 {
            Strength::Strong
        } else if abs_r >= 0.35 {
            Strength::Moderate
        } else if abs_r >= 0.2 {
            Strength::Weak
        } else {
            Strength::None
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::None => write!(f, "none"),
            Strength::Weak => write!(f, "weak"),
            Strength::Moderate => write!(f, "moderate"),
            Strength::Strong => write!(f, "strong"),
        }
    }
}

/// Sign of a Spearman coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
    Neutral,
}

impl Direction {
    pub fn from_coefficient(r: f64) -> Self {
        if r > 0.0 {
            Direction::Positive
        } else if r < 0.0 {
            Direction::Negative
        } else {
            Direction::Neutral
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Positive => write!(f, "positive"),
            Direction::Negative => write!(f, "negative"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

/// A correlation between two metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub x: Metric,
    /// Metric compared against x, taken `lag_days` later
    pub y: Metric,
    pub lag_days: i64,
    pub pearson: f64,
    pub spearman: f64,
    /// Number of paired observations used
    pub n: usize,
    pub strength: Strength,
    pub direction: Direction,
}

impl CorrelationResult {
    /// Column key of the (possibly shifted) y series, e.g. `sugar_g_lag`
    pub fn y_key(&self) -> String {
        if self.lag_days == 0 {
            self.y.column().to_string()
        } else {
            format!("{}_lag", self.y.column())
        }
    }
}

/// Correlate each pair, dropping pairs with too few complete observations
///
/// With a non-zero lag, x on day N is paired with y on day N + `lag_days`.
pub fn correlate(
    series: &[UnifiedRecord],
    pairs: &[(Metric, Metric)],
    lag_days: i64,
) -> Vec<CorrelationResult> {
    pairs
        .iter()
        .filter_map(|&(x, y)| {
            let (xs, ys) = paired_samples(series, x, y, lag_days);
            if xs.len() < MIN_SAMPLES {
                tracing::debug!(x = %x, y = %y, lag_days, n = xs.len(), "Skipping undersized pair");
                return None;
            }

            let pearson = pearson_correlation(&xs, &ys)?;
            let spearman = spearman_correlation(&xs, &ys)?;

            Some(CorrelationResult {
                x,
                y,
                lag_days,
                pearson,
                spearman,
                n: xs.len(),
                strength: Strength::from_coefficient(spearman),
                direction: Direction::from_coefficient(spearman),
            })
        })
        .collect()
}

/// Complete (x, y) observations, y shifted by `lag_days` calendar days
pub fn paired_samples(
    series: &[UnifiedRecord],
    x: Metric,
    y: Metric,
    lag_days: i64,
) -> (Vec<f64>, Vec<f64>) {
    let y_by_date: HashMap<NaiveDate, f64> = series
        .iter()
        .filter_map(|r| r.value(y).map(|v| (r.date, v)))
        .collect();

    series
        .iter()
        .filter_map(|r| {
            let x_val = r.value(x)?;
            let target = r.date.checked_add_signed(Duration::days(lag_days))?;
            let y_val = y_by_date.get(&target)?;
            Some((x_val, *y_val))
        })
        .unzip()
}

/// Calculate Pearson correlation coefficient
///
/// Returns `None` for mismatched or empty input, or when either side has
/// no variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Calculate Spearman rank correlation (Pearson over average ranks)
pub fn spearman_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson_correlation(&average_ranks(x), &average_ranks(y))
}

/// 1-based ranks, ties sharing their mean rank
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j hold ranks i+1..=j+1
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unify::{DailyMetrics, DEFAULT_USER_ID};
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap() + Duration::days(offset)
    }

    fn record(offset: i64, sleep: Option<f64>, sugar: Option<f64>) -> UnifiedRecord {
        UnifiedRecord {
            date: day(offset),
            user_id: DEFAULT_USER_ID.to_string(),
            metrics: DailyMetrics {
                sleep_hours: sleep,
                sugar_g: sugar,
                ..Default::default()
            },
            provenance: BTreeMap::new(),
            sources_used: vec![],
            last_sync_iso: DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_pearson_correlation_perfect_positive() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let r = pearson_correlation(&x, &y).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_correlation_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let r = pearson_correlation(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert_eq!(pearson_correlation(&[], &[]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(pearson_correlation(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_pearson_symmetric() {
        let x = vec![1.0, 4.0, 2.0, 8.0, 5.0, 7.0];
        let y = vec![2.0, 3.0, 1.0, 9.0, 4.0, 4.0];
        let xy = pearson_correlation(&x, &y).unwrap();
        let yx = pearson_correlation(&y, &x).unwrap();
        assert!((xy - yx).abs() < 1e-12);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        let x: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v.powi(3)).collect();
        let rho = spearman_correlation(&x, &y).unwrap();
        assert!((rho - 1.0).abs() < 1e-12);
        assert!(pearson_correlation(&x, &y).unwrap() < 1.0);
    }

    #[test]
    fn test_strength_boundaries() {
        assert_eq!(Strength::from_coefficient(0.6), Strength::Strong);
        assert_eq!(Strength::from_coefficient(-0.6), Strength::Strong);
        assert_eq!(Strength::from_coefficient(0.35), Strength::Moderate);
        assert_eq!(Strength::from_coefficient(0.2), Strength::Weak);
        assert_eq!(Strength::from_coefficient(-0.2), Strength::Weak);
        assert_eq!(Strength::from_coefficient(0.1999), Strength::None);
        assert_eq!(Strength::from_coefficient(0.0), Strength::None);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::from_coefficient(0.3), Direction::Positive);
        assert_eq!(Direction::from_coefficient(-0.3), Direction::Negative);
        assert_eq!(Direction::from_coefficient(0.0), Direction::Neutral);
    }

    #[test]
    fn test_lag_pairs_x_with_next_day_y() {
        // sugar on day N+1 mirrors sleep on day N
        let series: Vec<UnifiedRecord> = (0..15)
            .map(|i| {
                let sleep = 5.0 + (i % 4) as f64;
                let prev_sleep = 5.0 + ((i + 3) % 4) as f64;
                record(i, Some(sleep), Some(100.0 - prev_sleep * 10.0))
            })
            .collect();

        let (xs, ys) = paired_samples(&series, Metric::SleepHours, Metric::SugarG, 1);
        assert_eq!(xs.len(), 14);
        assert_eq!(xs[0], 5.0);
        assert_eq!(ys[0], series[1].metrics.sugar_g.unwrap());

        let results = correlate(&series, &[(Metric::SleepHours, Metric::SugarG)], 1);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.lag_days, 1);
        assert_eq!(result.n, 14);
        assert!((result.spearman + 1.0).abs() < 1e-9);
        assert_eq!(result.strength, Strength::Strong);
        assert_eq!(result.direction, Direction::Negative);
        assert_eq!(result.y_key(), "sugar_g_lag");
    }

    #[test]
    fn test_undersized_pair_dropped_after_shift() {
        // 10 complete same-day rows, but only 9 once y is shifted
        let series: Vec<UnifiedRecord> = (0..10)
            .map(|i| record(i, Some(6.0 + i as f64 * 0.1), Some(40.0 + (i * 7 % 5) as f64)))
            .collect();

        let same_day = correlate(&series, &[(Metric::SleepHours, Metric::SugarG)], 0);
        assert_eq!(same_day.len(), 1);
        assert_eq!(same_day[0].n, 10);

        let lagged = correlate(&series, &[(Metric::SleepHours, Metric::SugarG)], 1);
        assert!(lagged.is_empty());
    }

    #[test]
    fn test_missing_rows_dropped() {
        let series: Vec<UnifiedRecord> = (0..12)
            .map(|i| {
                let sugar = if i % 3 == 0 { None } else { Some(30.0 + i as f64) };
                record(i, Some(7.0 + i as f64), sugar)
            })
            .collect();

        let (xs, _) = paired_samples(&series, Metric::SleepHours, Metric::SugarG, 0);
        assert_eq!(xs.len(), 8);
        assert!(correlate(&series, &[(Metric::SleepHours, Metric::SugarG)], 0).is_empty());
    }

    #[test]
    fn test_swapped_pair_same_magnitude() {
        let series: Vec<UnifiedRecord> = (0..12)
            .map(|i| record(i, Some((i * 5 % 7) as f64), Some((i * 3 % 11) as f64)))
            .collect();

        let xy = correlate(&series, &[(Metric::SleepHours, Metric::SugarG)], 0);
        let yx = correlate(&series, &[(Metric::SugarG, Metric::SleepHours)], 0);
        assert!((xy[0].pearson - yx[0].pearson).abs() < 1e-12);
        assert!((xy[0].spearman - yx[0].spearman).abs() < 1e-12);
    }
}
