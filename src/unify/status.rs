//! Source and coverage status for a merged series

use super::merge::SourceBatch;
use super::types::{CoverageStat, Metric, SourceStatus, SourcesStatus, UnifiedRecord};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Named metric groups whose joint availability is reported
pub const COVERAGE_GROUPS: [(&str, &[Metric]); 4] = [
    ("sleep+activity", &[Metric::SleepHours, Metric::Steps]),
    ("sleep+nutrition", &[Metric::SleepHours, Metric::SugarG]),
    ("sleep+vitals", &[Metric::SleepHours, Metric::RestingHr]),
    ("activity+nutrition", &[Metric::Steps, Metric::SugarG]),
];

/// Days on which every metric of the group is present
pub fn coverage(records: &[UnifiedRecord], metrics: &[Metric]) -> CoverageStat {
    let covered = records
        .iter()
        .filter(|r| metrics.iter().all(|m| r.metrics.has(*m)))
        .count();
    CoverageStat::new(covered, records.len())
}

/// Build the status summary for a merge
///
/// A source listed with no records is reported as disconnected. When no
/// source contributed anything the source map is left empty.
pub fn build_sources_status(records: &[UnifiedRecord], batches: &[SourceBatch]) -> SourcesStatus {
    let mut sources = BTreeMap::new();

    if batches.iter().any(|b| !b.records.is_empty()) {
        // A source may arrive in several batches; days counts the union
        let mut dates: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();

        for batch in batches {
            let last_sync_iso = batch.records.iter().map(|r| r.last_sync_iso).max();
            dates
                .entry(batch.source.as_str())
                .or_default()
                .extend(batch.records.iter().map(|r| r.date));

            let entry = sources.entry(batch.source.clone()).or_insert(SourceStatus {
                connected: false,
                days: 0,
                last_sync_iso: None,
            });
            entry.connected |= !batch.records.is_empty();
            entry.last_sync_iso = entry.last_sync_iso.max(last_sync_iso);
        }

        for (source, seen) in dates {
            if let Some(entry) = sources.get_mut(source) {
                entry.days = seen.len();
            }
        }
    }

    let coverage = COVERAGE_GROUPS
        .iter()
        .map(|(name, metrics)| (name.to_string(), coverage(records, metrics)))
        .collect();

    let last_sync_iso = records.iter().map(|r| r.last_sync_iso).max();

    SourcesStatus {
        sources,
        coverage,
        last_sync_iso,
    }
}
