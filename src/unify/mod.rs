//! Data Unification
//!
//! Normalizes per-provider tables and merges them into one record per day.
//!
//! ## Architecture
//!
//! - **RawTable**: untyped rows as handed over by a data source
//! - **Normalizer**: strict dates, lenient metric cells, provenance tags
//! - **Merger**: per-metric resolution by source priority
//! - **Status**: per-source sync summary and metric-group coverage
//!
//! ## Data Flow
//!
//! 1. Each provider table is normalized under its source name
//! 2. Records are grouped by date across all sources
//! 3. Every metric is taken from the highest-priority source that has it
//! 4. The status summary is computed over the unified series

mod error;
mod merge;
mod normalize;
mod status;
mod table;
mod types;

pub use error::{UnifyError, UnifyResult};
pub use merge::{merge_by_date, source_rank, MergeOutput, SourceBatch, SOURCE_PRIORITY, UNRANKED};
pub use normalize::{
    ingest, normalize, parse_date, sync_timestamp, SourceSpec, APPLE_HEALTH, GOOGLE_FIT,
    MY_FITNESS_PAL,
};
pub use status::{build_sources_status, coverage, COVERAGE_GROUPS};
pub use table::{RawRow, RawTable};
pub use types::{
    CoverageStat, DailyMetrics, Metric, MetricKind, NormalizedDailyRecord, SourceStatus,
    SourcesStatus, UnifiedRecord, DEFAULT_USER_ID,
};
