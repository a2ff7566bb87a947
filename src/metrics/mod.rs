//! Metrics collection and exposition.

mod collector;
mod counter;
mod error;
mod histogram;
mod registry;
pub mod text;

pub use collector::{REQUEST_LATENCY_SECONDS, REQUESTS_TOTAL, RequestMetrics, RequestTimer};
pub use counter::Counter;
pub use error::MetricsError;
pub use histogram::{DEFAULT_BUCKETS, Histogram, HistogramSnapshot, validate_buckets};
pub use registry::{Metric, MetricKind, MetricRegistry, is_valid_metric_name};
