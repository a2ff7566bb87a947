//! Metric registry.
//!
//! Owns every counter and histogram by name and renders them in the text
//! exposition format. The registry is an explicit value handed to whatever
//! needs it; there is no process-global instance.

use crate::metrics::text;
use crate::metrics::{Counter, DEFAULT_BUCKETS, Histogram, MetricsError, validate_buckets};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// The kind of a registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Histogram,
}

impl MetricKind {
    /// Name used on the `# TYPE` line.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handle to a registered metric.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Histogram(Arc<Histogram>),
}

impl Metric {
    /// Kind of this metric.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Histogram(_) => MetricKind::Histogram,
        }
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        match self {
            Metric::Counter(c) => c.name(),
            Metric::Histogram(h) => h.name(),
        }
    }

    /// Help text.
    pub fn help(&self) -> &str {
        match self {
            Metric::Counter(c) => c.help(),
            Metric::Histogram(h) => h.help(),
        }
    }
}

/// Check that `name` matches `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// A registered metric plus its registration sequence number.
#[derive(Debug)]
struct Registration {
    seq: u64,
    metric: Metric,
}

/// Process-wide store of named metrics.
///
/// Cloning is cheap and every clone shares the same metrics.
#[derive(Clone, Default)]
pub struct MetricRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    /// Metrics by name.
    metrics: DashMap<String, Registration>,
    /// Next registration sequence number, used for render order.
    next_seq: AtomicU64,
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create a counter.
    ///
    /// Returns the existing counter when `name` is already a counter with the
    /// same help text. Concurrent first-time callers all receive the same
    /// instance.
    pub fn counter(&self, name: &str, help: &str) -> Result<Arc<Counter>, MetricsError> {
        check_name(name)?;

        match self.inner.metrics.entry(name.to_string()) {
            Entry::Occupied(entry) => match &entry.get().metric {
                Metric::Counter(counter) => {
                    check_help(name, counter.help(), help)?;
                    Ok(Arc::clone(counter))
                }
                other => Err(duplicate(name, other.kind(), MetricKind::Counter)),
            },
            Entry::Vacant(entry) => {
                let counter = Arc::new(Counter::new(name, help));
                let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(Registration {
                    seq,
                    metric: Metric::Counter(Arc::clone(&counter)),
                });
                debug!(name = %name, kind = "counter", "registered metric");
                Ok(counter)
            }
        }
    }

    /// Find or create a histogram with [`DEFAULT_BUCKETS`].
    pub fn histogram(&self, name: &str, help: &str) -> Result<Arc<Histogram>, MetricsError> {
        self.histogram_with_buckets(name, help, &DEFAULT_BUCKETS)
    }

    /// Find or create a histogram with explicit bucket bounds.
    ///
    /// Re-registering an existing histogram requires the same help text and
    /// the same bounds.
    pub fn histogram_with_buckets(
        &self,
        name: &str,
        help: &str,
        buckets: &[f64],
    ) -> Result<Arc<Histogram>, MetricsError> {
        check_name(name)?;
        let bounds = validate_buckets(name, buckets)?;

        match self.inner.metrics.entry(name.to_string()) {
            Entry::Occupied(entry) => match &entry.get().metric {
                Metric::Histogram(histogram) => {
                    check_help(name, histogram.help(), help)?;
                    if histogram.bounds() != bounds.as_slice() {
                        return Err(MetricsError::ConflictingBuckets {
                            name: name.to_string(),
                        });
                    }
                    Ok(Arc::clone(histogram))
                }
                other => Err(duplicate(name, other.kind(), MetricKind::Histogram)),
            },
            Entry::Vacant(entry) => {
                let histogram = Arc::new(Histogram::new(name, help, &bounds)?);
                let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(Registration {
                    seq,
                    metric: Metric::Histogram(Arc::clone(&histogram)),
                });
                debug!(
                    name = %name,
                    kind = "histogram",
                    buckets = bounds.len(),
                    "registered metric"
                );
                Ok(histogram)
            }
        }
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.inner.metrics.get(name).map(|r| r.metric.clone())
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.inner.metrics.len()
    }

    /// Whether no metric has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.inner.metrics.is_empty()
    }

    /// All metrics in registration order.
    ///
    /// Only the handles are copied while the table is read, so this holds the
    /// table's shard locks for as long as it takes to clone a few `Arc`s.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut entries: Vec<(u64, Metric)> = self
            .inner
            .metrics
            .iter()
            .map(|r| (r.seq, r.metric.clone()))
            .collect();
        entries.sort_unstable_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, metric)| metric).collect()
    }

    /// Render every metric in the text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = String::new();
        // Writing into a String cannot fail.
        let _ = text::encode(&mut buffer, &self.metrics());
        buffer
    }
}

fn check_name(name: &str) -> Result<(), MetricsError> {
    if is_valid_metric_name(name) {
        Ok(())
    } else {
        Err(MetricsError::InvalidName(name.to_string()))
    }
}

fn check_help(name: &str, existing: &str, requested: &str) -> Result<(), MetricsError> {
    if existing == requested {
        Ok(())
    } else {
        Err(MetricsError::ConflictingHelp {
            name: name.to_string(),
            existing: existing.to_string(),
            requested: requested.to_string(),
        })
    }
}

fn duplicate(name: &str, existing: MetricKind, requested: MetricKind) -> MetricsError {
    MetricsError::DuplicateMetric {
        name: name.to_string(),
        existing,
        requested,
    }
}
