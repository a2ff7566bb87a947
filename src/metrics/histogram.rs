//! Cumulative histogram with fixed bucket bounds.

use crate::metrics::MetricsError;
use parking_lot::Mutex;

/// Default bucket upper bounds, in seconds.
///
/// These are the conventional request-latency buckets (5ms up to 10s). They are
/// used whenever a histogram is registered without explicit buckets. The `+Inf`
/// bucket is always implied and never listed.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Check a caller-supplied bucket list and return the bounds to use.
///
/// Bounds must be finite and strictly increasing, and there must be at least
/// one. A single trailing `+Inf` is accepted and dropped since that bucket
/// always exists.
pub fn validate_buckets(name: &str, buckets: &[f64]) -> Result<Vec<f64>, MetricsError> {
    let invalid = |reason: String| MetricsError::InvalidBuckets {
        name: name.to_string(),
        reason,
    };

    let bounds = match buckets.split_last() {
        Some((last, rest)) if *last == f64::INFINITY => rest,
        _ => buckets,
    };

    if bounds.is_empty() {
        return Err(invalid("at least one finite bucket is required".to_string()));
    }

    if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(invalid(format!("bucket bound {} is not finite", bad)));
    }

    if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(invalid(format!(
            "bucket bounds must be strictly increasing, got {} before {}",
            pair[0], pair[1]
        )));
    }

    Ok(bounds.to_vec())
}

/// Observation state guarded as one unit.
#[derive(Debug, Clone)]
struct HistogramState {
    /// Non-cumulative count per bucket; the last slot is the `+Inf` bucket.
    counts: Vec<u64>,
    sum: f64,
    count: u64,
}

/// A distribution recorder with fixed bucket bounds, a running sum and a
/// total count.
///
/// Each `observe` updates counts, sum and total under a single lock, so a
/// [`snapshot`](Histogram::snapshot) never sees half of an observation.
#[derive(Debug)]
pub struct Histogram {
    name: String,
    help: String,
    bounds: Vec<f64>,
    state: Mutex<HistogramState>,
}

/// A point-in-time copy of a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Finite bucket upper bounds, strictly increasing.
    pub bounds: Vec<f64>,
    /// Cumulative count per finite bound (index-aligned with `bounds`).
    pub cumulative_counts: Vec<u64>,
    /// Total observations, which is also the `+Inf` bucket count.
    pub count: u64,
    /// Sum of all observed values.
    pub sum: f64,
}

impl HistogramSnapshot {
    /// Cumulative count for the bucket with upper bound `le`, if it exists.
    /// `f64::INFINITY` selects the `+Inf` bucket.
    pub fn bucket(&self, le: f64) -> Option<u64> {
        if le == f64::INFINITY {
            return Some(self.count);
        }
        self.bounds
            .iter()
            .position(|b| *b == le)
            .map(|i| self.cumulative_counts[i])
    }
}

impl Histogram {
    /// Build a histogram, validating `buckets` first.
    pub(crate) fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        buckets: &[f64],
    ) -> Result<Self, MetricsError> {
        let name = name.into();
        let bounds = validate_buckets(&name, buckets)?;
        let state = HistogramState {
            counts: vec![0; bounds.len() + 1],
            sum: 0.0,
            count: 0,
        };

        Ok(Self {
            name,
            help: help.into(),
            bounds,
            state: Mutex::new(state),
        })
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Finite bucket upper bounds.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Record one observation.
    pub fn observe(&self, value: f64) {
        // First bucket whose bound is >= value. NaN compares false against
        // every bound and lands in +Inf only.
        let index = if value.is_nan() {
            self.bounds.len()
        } else {
            self.bounds.partition_point(|bound| *bound < value)
        };

        let mut state = self.state.lock();
        state.counts[index] += 1;
        state.sum += value;
        state.count += 1;
    }

    /// Take a consistent copy of the current counts, sum and total.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let state = self.state.lock().clone();

        let mut cumulative_counts = Vec::with_capacity(self.bounds.len());
        let mut running = 0;
        for count in &state.counts[..self.bounds.len()] {
            running += count;
            cumulative_counts.push(running);
        }

        HistogramSnapshot {
            bounds: self.bounds.clone(),
            cumulative_counts,
            count: state.count,
            sum: state.sum,
        }
    }
}
