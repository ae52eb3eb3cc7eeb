//! # WellSync
//!
//! Personal wellness aggregator. Daily sleep, activity, nutrition and
//! vitals from several providers are merged into one record per day, and
//! the unified series is mined for persistent anomalies and lagged
//! correlations.
//!
//! ## Modules
//!
//! - [`unify`]: normalization, priority merge and source status
//! - [`analytics`]: anomaly detection, correlations and insight cards
//! - [`services`]: snapshot-backed registry and dashboard views
//! - [`demo`]: deterministic demo data generator
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wellsync::analytics::InsightComposer;
//! use wellsync::unify::{ingest, merge_by_date, sync_timestamp, RawTable, SourceBatch, APPLE_HEALTH};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = RawTable::from_csv_path("apple_health.csv".as_ref())?;
//!     let records = ingest(&table, &APPLE_HEALTH, sync_timestamp())?;
//!
//!     let merged = merge_by_date(&[SourceBatch::new(APPLE_HEALTH.name, records)]);
//!     for card in InsightComposer::default().compose(&merged.records) {
//!         println!("{}: {}", card.title, card.summary);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod demo;
pub mod logging;
pub mod services;
pub mod unify;

// Re-export top-level types for convenience
pub use unify::{
    merge_by_date, normalize, Metric, NormalizedDailyRecord, RawTable, SourceBatch,
    SourcesStatus, UnifiedRecord, UnifyError, UnifyResult,
};

pub use analytics::{AnomalyConfig, AnomalyRun, CorrelationResult, InsightCard, InsightComposer};

pub use services::{ServiceError, ServiceRegistry, UnifiedSnapshot};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError};
