//! Shared application state.

use crate::config::Config;
use crate::metrics::{MetricRegistry, MetricsError, RequestMetrics};
use std::sync::Arc;

/// Shared state accessible from all connection tasks.
#[derive(Clone)]
pub struct AppState {
    /// Configuration the server was started with.
    config: Arc<Config>,

    /// Registry that owns every metric and renders the scrape.
    registry: MetricRegistry,

    /// Request counter and latency histogram.
    request_metrics: RequestMetrics,
}

impl AppState {
    /// Create application state with a fresh registry.
    pub fn new(config: Config) -> Result<Self, MetricsError> {
        Self::with_registry(config, MetricRegistry::new())
    }

    /// Create application state around an existing registry.
    pub fn with_registry(config: Config, registry: MetricRegistry) -> Result<Self, MetricsError> {
        let request_metrics =
            RequestMetrics::register(&registry, config.metrics.latency_buckets.as_deref())?;

        Ok(Self {
            config: Arc::new(config),
            registry,
            request_metrics,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the metric registry.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Get the request metrics.
    pub fn request_metrics(&self) -> &RequestMetrics {
        &self.request_metrics
    }
}
