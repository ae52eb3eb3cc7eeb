//! Insight Composer
//!
//! Turns the strongest correlations and the first persistent anomaly of a
//! unified series into display cards with a title, a summary, the numeric
//! evidence and a responsible-use note.

use super::anomalies::{detect, AnomalyConfig, AnomalyRun};
use super::correlations::{correlate, CorrelationResult, Strength};
use crate::unify::{Metric, UnifiedRecord};
use serde::Serialize;

/// Pairs correlated on the same day
pub const SAME_DAY_PAIRS: [(Metric, Metric); 4] = [
    (Metric::SleepHours, Metric::SugarG),
    (Metric::SleepHours, Metric::Steps),
    (Metric::ActiveMinutes, Metric::SleepHours),
    (Metric::SleepHours, Metric::RestingHr),
];

/// Pairs correlated against the next day's y
pub const NEXT_DAY_PAIRS: [(Metric, Metric); 1] = [(Metric::SleepHours, Metric::SugarG)];

/// Metrics scanned for anomalies, in reporting order
pub const ANOMALY_METRICS: [Metric; 2] = [Metric::RestingHr, Metric::SleepHours];

pub const MAX_CORRELATION_CARDS: usize = 2;

pub const CORRELATION_NOTE: &str = "Correlation does not imply causation.";
pub const ANOMALY_NOTE: &str = "This is not medical advice; anomalies can have benign causes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Correlation,
    Anomaly,
}

/// Numbers behind a correlation card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEvidence {
    pub x: Metric,
    /// Key of the compared series, `_lag` suffixed when shifted
    pub y: String,
    pub metric_y: Metric,
    pub lag_days: i64,
    pub pearson: f64,
    pub spearman: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Evidence {
    Correlation(CorrelationEvidence),
    Anomaly(AnomalyRun),
}

/// A rendered insight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightCard {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub summary: String,
    pub evidence: Evidence,
    pub responsible_note: String,
}

/// Composes insight cards from a unified series
#[derive(Debug, Clone, Default)]
pub struct InsightComposer {
    anomaly: AnomalyConfig,
}

impl InsightComposer {
    pub fn new(anomaly: AnomalyConfig) -> Self {
        Self { anomaly }
    }

    pub fn anomaly_config(&self) -> &AnomalyConfig {
        &self.anomaly
    }

    /// Correlation cards by descending |Spearman|, then at most one anomaly card
    pub fn compose(&self, series: &[UnifiedRecord]) -> Vec<InsightCard> {
        let mut cards: Vec<InsightCard> = top_correlations(series)
            .iter()
            .map(correlation_card)
            .collect();

        let first_anomaly = ANOMALY_METRICS
            .iter()
            .flat_map(|&metric| detect(series, metric, &self.anomaly))
            .next();

        if let Some(run) = first_anomaly {
            cards.push(anomaly_card(&run));
        }

        tracing::debug!(
            days = series.len(),
            cards = cards.len(),
            "Composed insight cards"
        );

        cards
    }
}

/// Same-day and next-day results pooled, ranked, and cut to the card limit
pub fn top_correlations(series: &[UnifiedRecord]) -> Vec<CorrelationResult> {
    let mut pooled = correlate(series, &SAME_DAY_PAIRS, 0);
    pooled.extend(correlate(series, &NEXT_DAY_PAIRS, 1));

    pooled.sort_by(|a, b| b.spearman.abs().total_cmp(&a.spearman.abs()));
    pooled
        .into_iter()
        .filter(|c| c.strength != Strength::None)
        .take(MAX_CORRELATION_CARDS)
        .collect()
}

pub fn correlation_card(c: &CorrelationResult) -> InsightCard {
    let y_key = c.y_key();
    InsightCard {
        id: format!("corr:{}:{}:{}", c.x, y_key, c.lag_days),
        kind: InsightKind::Correlation,
        title: correlation_title(c),
        summary: correlation_summary(c),
        evidence: Evidence::Correlation(CorrelationEvidence {
            x: c.x,
            y: y_key,
            metric_y: c.y,
            lag_days: c.lag_days,
            pearson: c.pearson,
            spearman: c.spearman,
            n: c.n,
        }),
        responsible_note: CORRELATION_NOTE.to_string(),
    }
}

pub fn anomaly_card(run: &AnomalyRun) -> InsightCard {
    InsightCard {
        id: format!("anom:{}:{}:{}", run.metric, run.start_date, run.end_date),
        kind: InsightKind::Anomaly,
        title: format!("Anomalous pattern detected: {}", run.metric.label()),
        summary: format!(
            "{} deviated from your rolling baseline for {} consecutive days.",
            run.metric.label(),
            run.days
        ),
        evidence: Evidence::Anomaly(run.clone()),
        responsible_note: ANOMALY_NOTE.to_string(),
    }
}

fn correlation_title(c: &CorrelationResult) -> String {
    let base = format!("{} ↔ {}", c.x.label(), c.y.label());
    match c.lag_days {
        0 => base,
        1 => format!("{} (next-day relationship)", base),
        n => format!("{} ({}-day lag)", base, n),
    }
}

fn correlation_summary(c: &CorrelationResult) -> String {
    let x = c.x.label();
    let y = c.y.label();
    if c.spearman > 0.0 {
        format!(
            "When {} is higher, {} tends to be higher (Spearman {:.2}).",
            x, y, c.spearman
        )
    } else if c.spearman < 0.0 {
        format!(
            "When {} is lower, {} tends to be higher (Spearman {:.2}).",
            x, y, c.spearman
        )
    } else {
        format!("No clear relationship detected between {} and {}.", x, y)
    }
}
