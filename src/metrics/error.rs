//! Errors raised by metric registration and updates.
//!
//! All of these point at a bug in the instrumentation call site. None of them
//! are transient, so callers should surface them rather than retry.

use crate::metrics::MetricKind;
use thiserror::Error;

/// Errors that can occur when registering or updating a metric.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("metric name '{0}' is invalid, must match [a-zA-Z_:][a-zA-Z0-9_:]*")]
    InvalidName(String),

    #[error("metric '{name}' is already registered as a {existing}, cannot register it as a {requested}")]
    DuplicateMetric {
        name: String,
        existing: MetricKind,
        requested: MetricKind,
    },

    #[error("metric '{name}' is already registered with help '{existing}', got '{requested}'")]
    ConflictingHelp {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("counter '{name}' cannot be incremented by {delta}, delta must be >= 0")]
    InvalidDelta { name: String, delta: f64 },

    #[error("histogram '{name}' has invalid buckets: {reason}")]
    InvalidBuckets { name: String, reason: String },

    #[error("histogram '{name}' is already registered with different buckets")]
    ConflictingBuckets { name: String },
}
