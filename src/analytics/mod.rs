//! Insight Analytics
//!
//! Statistical insights over the unified daily series.
//!
//! ## Architecture
//!
//! - **Anomaly Detector**: rolling z-scores with a persistence filter
//! - **Correlation Engine**: lagged Spearman/Pearson with a sample floor
//! - **Insight Composer**: ranks both into display cards
//!
//! Every function here is pure: the same series always yields the same
//! results, and nothing is cached between calls.

mod anomalies;
mod correlations;
mod insights;

pub use anomalies::{
    detect, group_runs, rolling_baseline, score, z_score, AnomalyConfig, AnomalyRun, Baseline,
    ScoredDay,
};
pub use correlations::{
    correlate, paired_samples, pearson_correlation, spearman_correlation, CorrelationResult,
    Direction, Strength, MIN_SAMPLES,
};
pub use insights::{
    anomaly_card, correlation_card, top_correlations, CorrelationEvidence, Evidence,
    InsightCard, InsightComposer, InsightKind, ANOMALY_METRICS, ANOMALY_NOTE, CORRELATION_NOTE,
    MAX_CORRELATION_CARDS, NEXT_DAY_PAIRS, SAME_DAY_PAIRS,
};
