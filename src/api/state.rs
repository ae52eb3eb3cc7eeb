//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::analytics::InsightComposer;
use crate::config::{ApiConfig, Config};
use crate::services::ServiceRegistry;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Snapshot-backed data access
    pub registry: Arc<ServiceRegistry>,
    /// Insight card builder with the configured anomaly parameters
    pub composer: Arc<InsightComposer>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(registry: ServiceRegistry, composer: InsightComposer, config: ApiConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            composer: Arc::new(composer),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Build state from a full application config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ServiceRegistry::new(config.data.clone()),
            InsightComposer::new(config.analytics.anomaly()),
            config.api.clone(),
        )
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
