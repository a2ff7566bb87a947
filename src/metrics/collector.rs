//! Request instrumentation built on the registry.
//!
//! Provides the request counter and latency histogram that the HTTP handlers
//! update on every request.

use crate::metrics::{Counter, DEFAULT_BUCKETS, Histogram, MetricRegistry, MetricsError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Name of the request counter.
pub const REQUESTS_TOTAL: &str = "api_requests_total";

/// Name of the request latency histogram.
pub const REQUEST_LATENCY_SECONDS: &str = "api_request_latency_seconds";

/// Handles to the request metrics.
#[derive(Clone)]
pub struct RequestMetrics {
    /// Total requests counter.
    requests_total: Arc<Counter>,
    /// Request latency histogram (in seconds).
    request_latency_seconds: Arc<Histogram>,
}

impl RequestMetrics {
    /// Register (or look up) the request metrics in `registry`.
    ///
    /// `buckets` overrides [`DEFAULT_BUCKETS`] for the latency histogram.
    pub fn register(
        registry: &MetricRegistry,
        buckets: Option<&[f64]>,
    ) -> Result<Self, MetricsError> {
        let requests_total = registry.counter(REQUESTS_TOTAL, "Total number of API requests")?;
        let request_latency_seconds = registry.histogram_with_buckets(
            REQUEST_LATENCY_SECONDS,
            "API request latency in seconds",
            buckets.unwrap_or(&DEFAULT_BUCKETS[..]),
        )?;

        Ok(Self {
            requests_total,
            request_latency_seconds,
        })
    }

    /// Count a request that is starting.
    pub fn on_request_start(&self) {
        self.requests_total.inc();
    }

    /// Record how long a finished request took.
    pub fn on_request_end(&self, duration: Duration) {
        self.request_latency_seconds.observe(duration.as_secs_f64());
    }

    /// Count a request and start timing it.
    pub fn start_timer(&self) -> RequestTimer {
        self.on_request_start();
        RequestTimer {
            metrics: self.clone(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// The request counter.
    pub fn requests_total(&self) -> &Arc<Counter> {
        &self.requests_total
    }

    /// The latency histogram.
    pub fn request_latency_seconds(&self) -> &Arc<Histogram> {
        &self.request_latency_seconds
    }
}

/// Timer guard that records request latency.
///
/// Latency is recorded by [`finish`](RequestTimer::finish), or on drop if the
/// timer was never finished.
pub struct RequestTimer {
    metrics: RequestMetrics,
    start: Instant,
    recorded: bool,
}

impl RequestTimer {
    /// Get the elapsed duration.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record the latency and consume the timer.
    pub fn finish(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.metrics.on_request_end(duration);
        self.recorded = true;
        duration
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.recorded {
            self.metrics.on_request_end(self.start.elapsed());
        }
    }
}
