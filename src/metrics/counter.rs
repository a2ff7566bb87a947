//! Monotonic counter.

use crate::metrics::MetricsError;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically non-decreasing value.
///
/// The value is an `f64` stored as raw bits in an `AtomicU64`, so increments
/// are lock-free and never lose updates under contention.
#[derive(Debug)]
pub struct Counter {
    name: String,
    help: String,
    value: AtomicU64,
}

impl Counter {
    pub(crate) fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            value: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Increment by one.
    pub fn inc(&self) {
        self.add(1.0);
    }

    /// Increment by `delta`.
    ///
    /// Fails with [`MetricsError::InvalidDelta`] if `delta` is negative or NaN;
    /// the stored value is left untouched in that case.
    pub fn increment(&self, delta: f64) -> Result<(), MetricsError> {
        if delta.is_nan() || delta < 0.0 {
            return Err(MetricsError::InvalidDelta {
                name: self.name.clone(),
                delta,
            });
        }
        self.add(delta);
        Ok(())
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }

    fn add(&self, delta: f64) {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.value.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}
