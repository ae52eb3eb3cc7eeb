//! Date Merger
//!
//! Aligns records from every source by date and resolves each metric
//! independently by source priority, so one unified day can blend fields
//! from different sources.

use super::status::build_sources_status;
use super::types::{
    DailyMetrics, Metric, NormalizedDailyRecord, SourcesStatus, UnifiedRecord, DEFAULT_USER_ID,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sources in descending order of trust
pub const SOURCE_PRIORITY: [&str; 3] = ["Apple Health", "Google Fit", "MyFitnessPal"];

/// Rank given to sources outside `SOURCE_PRIORITY`
pub const UNRANKED: usize = SOURCE_PRIORITY.len();

/// Total order over sources: known sources by priority, unknown ones after
pub fn source_rank(source: &str) -> usize {
    SOURCE_PRIORITY
        .iter()
        .position(|s| *s == source)
        .unwrap_or(UNRANKED)
}

/// All records reported by one source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source: String,
    pub records: Vec<NormalizedDailyRecord>,
}

impl SourceBatch {
    pub fn new(source: impl Into<String>, records: Vec<NormalizedDailyRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }
}

/// Unified series plus its status summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutput {
    /// One record per date, ascending
    pub records: Vec<UnifiedRecord>,
    pub status: SourcesStatus,
}

type Tagged<'a> = (&'a str, &'a NormalizedDailyRecord);

/// Merge per-source records into one record per date
///
/// Batches are read in order; that order is the "encounter order" used for
/// `user_id` selection and for ranking sources outside the priority list.
pub fn merge_by_date(batches: &[SourceBatch]) -> MergeOutput {
    let mut by_date: BTreeMap<NaiveDate, Vec<Tagged<'_>>> = BTreeMap::new();
    for batch in batches {
        for record in &batch.records {
            by_date
                .entry(record.date)
                .or_default()
                .push((batch.source.as_str(), record));
        }
    }

    if by_date.is_empty() {
        return MergeOutput {
            records: Vec::new(),
            status: build_sources_status(&[], &[]),
        };
    }

    let records: Vec<UnifiedRecord> = by_date
        .into_iter()
        .filter_map(|(date, group)| merge_day(date, &group))
        .collect();

    let status = build_sources_status(&records, batches);

    tracing::debug!(
        sources = batches.len(),
        days = records.len(),
        "Merged source records by date"
    );

    MergeOutput { records, status }
}

/// Resolve one date's group; `None` only for an empty group
fn merge_day(date: NaiveDate, group: &[Tagged<'_>]) -> Option<UnifiedRecord> {
    let last_sync_iso = group.iter().map(|(_, r)| r.last_sync_iso).max()?;

    let user_id = group
        .iter()
        .map(|(_, r)| r.user_id.as_str())
        .find(|u| !u.is_empty())
        .unwrap_or(DEFAULT_USER_ID)
        .to_string();

    // Stable: equal ranks keep encounter order
    let mut ranked = group.to_vec();
    ranked.sort_by_key(|(source, _)| source_rank(source));

    let mut sources_used: Vec<String> = Vec::new();
    for (source, _) in &ranked {
        if !sources_used.iter().any(|s| s == source) {
            sources_used.push(source.to_string());
        }
    }

    let mut metrics = DailyMetrics::default();
    let mut provenance = BTreeMap::new();
    for metric in Metric::ALL {
        let winner = ranked.iter().find(|(_, r)| r.metrics.has(metric));
        if let Some((_, record)) = winner {
            metrics.copy_metric(metric, &record.metrics);
        }
        provenance.insert(metric, winner.map(|(source, _)| source.to_string()));
    }

    Some(UnifiedRecord {
        date,
        user_id,
        metrics,
        provenance,
        sources_used,
        last_sync_iso,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(offset)
    }

    fn record(source: &str, offset: i64) -> NormalizedDailyRecord {
        NormalizedDailyRecord::new(day(offset), source, at("2024-03-10T12:00:00Z"))
    }

    #[test]
    fn test_source_rank() {
        assert_eq!(source_rank("Apple Health"), 0);
        assert_eq!(source_rank("Google Fit"), 1);
        assert_eq!(source_rank("MyFitnessPal"), 2);
        assert_eq!(source_rank("Oura"), UNRANKED);
    }

    #[test]
    fn test_empty_input() {
        let out = merge_by_date(&[]);
        assert!(out.records.is_empty());
        assert!(out.status.sources.is_empty());
        assert!(out.status.last_sync_iso.is_none());
        assert!(out.status.coverage.values().all(|c| c.total_days == 0 && c.pct == 0.0));

        let out = merge_by_date(&[SourceBatch::new("Apple Health", vec![])]);
        assert!(out.records.is_empty());
        assert!(out.status.sources.is_empty());
    }

    #[test]
    fn test_priority_wins_per_metric() {
        let apple = SourceBatch::new(
            "Apple Health",
            vec![record("Apple Health", 0).with(Metric::SleepHours, 7.5)],
        );
        let google = SourceBatch::new(
            "Google Fit",
            vec![record("Google Fit", 0)
                .with(Metric::SleepHours, 6.0)
                .with(Metric::Steps, 9000.0)],
        );

        // Lower-priority source listed first must still lose
        let out = merge_by_date(&[google, apple]);
        let unified = &out.records[0];

        assert_eq!(unified.value(Metric::SleepHours), Some(7.5));
        assert_eq!(unified.source_of(Metric::SleepHours), Some("Apple Health"));
        assert_eq!(unified.value(Metric::Steps), Some(9000.0));
        assert_eq!(unified.source_of(Metric::Steps), Some("Google Fit"));
        assert_eq!(unified.source_of(Metric::Calories), None);
        assert_eq!(unified.sources_used, vec!["Apple Health", "Google Fit"]);
    }

    #[test]
    fn test_unknown_source_fallback() {
        let oura = SourceBatch::new(
            "Oura",
            vec![record("Oura", 0)
                .with(Metric::RestingHr, 55.0)
                .with(Metric::SleepHours, 8.0)],
        );
        let whoop = SourceBatch::new(
            "Whoop",
            vec![record("Whoop", 0).with(Metric::RestingHr, 58.0)],
        );
        let apple = SourceBatch::new(
            "Apple Health",
            vec![record("Apple Health", 0).with(Metric::SleepHours, 7.0)],
        );

        let out = merge_by_date(&[oura, whoop, apple]);
        let unified = &out.records[0];

        assert_eq!(unified.source_of(Metric::SleepHours), Some("Apple Health"));
        assert_eq!(unified.value(Metric::RestingHr), Some(55.0));
        assert_eq!(unified.source_of(Metric::RestingHr), Some("Oura"));
        assert_eq!(unified.sources_used, vec!["Apple Health", "Oura", "Whoop"]);
    }

    #[test]
    fn test_user_id_and_last_sync() {
        let early = NormalizedDailyRecord::new(day(0), "Google Fit", at("2024-03-10T08:00:00Z"))
            .user("first_user");
        let late = NormalizedDailyRecord::new(day(0), "Apple Health", at("2024-03-10T09:15:00Z"))
            .user("second_user");

        let out = merge_by_date(&[
            SourceBatch::new("Google Fit", vec![early]),
            SourceBatch::new("Apple Health", vec![late]),
        ]);

        assert_eq!(out.records[0].user_id, "first_user");
        assert_eq!(out.records[0].last_sync_iso, at("2024-03-10T09:15:00Z"));
    }

    #[test]
    fn test_dates_sorted_ascending() {
        let batch = SourceBatch::new(
            "Apple Health",
            vec![
                record("Apple Health", 2),
                record("Apple Health", 0),
                record("Apple Health", 1),
            ],
        );
        let out = merge_by_date(&[batch]);
        let dates: Vec<NaiveDate> = out.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
    }

    #[test]
    fn test_merge_idempotent_on_duplicates() {
        let records: Vec<NormalizedDailyRecord> = (0..5)
            .map(|i| {
                record("Apple Health", i)
                    .with(Metric::SleepHours, 6.5 + i as f64 * 0.1)
                    .with(Metric::Steps, 7000.0 + i as f64)
            })
            .collect();

        let once = merge_by_date(&[SourceBatch::new("Apple Health", records.clone())]);

        let mut doubled = records.clone();
        doubled.extend(records);
        let twice = merge_by_date(&[SourceBatch::new("Apple Health", doubled)]);

        assert_eq!(once.records, twice.records);
        assert_eq!(once.status, twice.status);
    }
}
