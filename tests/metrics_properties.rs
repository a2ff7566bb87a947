//! Behavioural tests for the metrics registry through the public API.

use eventmeter::metrics::{Metric, MetricRegistry, MetricsError};
use std::sync::Arc;

#[test]
fn test_counter_exposition_exact() {
    let registry = MetricRegistry::new();
    let counter = registry.counter("requests_total", "Total requests").unwrap();
    counter.increment(42.0).unwrap();

    assert_eq!(
        registry.render(),
        "# HELP requests_total Total requests\n\
         # TYPE requests_total counter\n\
         requests_total 42\n"
    );
}

#[test]
fn test_histogram_end_to_end() {
    let registry = MetricRegistry::new();
    let histogram = registry
        .histogram_with_buckets("latency_seconds", "Latency", &[0.1, 0.5, 1.0])
        .unwrap();

    for value in [0.05, 0.2, 0.2, 2.0] {
        histogram.observe(value);
    }

    let snapshot = histogram.snapshot();
    assert_eq!(snapshot.bucket(0.1), Some(1));
    assert_eq!(snapshot.bucket(0.5), Some(3));
    assert_eq!(snapshot.bucket(1.0), Some(3));
    assert_eq!(snapshot.bucket(f64::INFINITY), Some(4));
    assert_eq!(snapshot.count, 4);
    assert!((snapshot.sum - 2.45).abs() < 1e-12);
}

#[test]
fn test_reregistration_keeps_value() {
    let registry = MetricRegistry::new();
    registry.counter("x", "help").unwrap().increment(7.0).unwrap();

    let again = registry.counter("x", "help").unwrap();
    assert_eq!(again.value(), 7.0);
}

#[test]
fn test_kind_conflict() {
    let registry = MetricRegistry::new();
    registry.counter("x", "help1").unwrap();

    let result = registry.histogram_with_buckets("x", "help2", &[1.0]);
    assert!(matches!(result, Err(MetricsError::DuplicateMetric { .. })));

    // The existing counter is untouched
    assert!(matches!(registry.get("x"), Some(Metric::Counter(_))));
}

#[test]
fn test_negative_increment_rejected() {
    let registry = MetricRegistry::new();
    let counter = registry.counter("x", "help").unwrap();
    assert!(matches!(
        counter.increment(-0.5),
        Err(MetricsError::InvalidDelta { .. })
    ));
}

#[test]
fn test_counter_stress_threads() {
    let registry = MetricRegistry::new();
    let counter = registry.counter("stress_total", "Stress").unwrap();

    std::thread::scope(|s| {
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            s.spawn(move || {
                for _ in 0..1000 {
                    counter.increment(1.0).unwrap();
                }
            });
        }
    });

    assert_eq!(counter.value(), 100_000.0);
    assert!(registry.render().contains("stress_total 100000\n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counter_stress_tasks() {
    let registry = MetricRegistry::new();

    let tasks: Vec<_> = (0..100)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                // Every task registers by name; all must share one counter
                let counter = registry.counter("tasks_total", "Tasks").unwrap();
                for i in 0..1000 {
                    counter.inc();
                    if i % 100 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    match registry.get("tasks_total") {
        Some(Metric::Counter(counter)) => assert_eq!(counter.value(), 100_000.0),
        other => panic!("unexpected metric: {:?}", other),
    }
}

#[test]
fn test_render_during_updates_is_consistent() {
    let registry = MetricRegistry::new();
    let histogram = registry
        .histogram_with_buckets("h", "help", &[0.5, 2.0])
        .unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let histogram = Arc::clone(&histogram);
            s.spawn(move || {
                for _ in 0..5000 {
                    histogram.observe(1.0);
                }
            });
        }

        let registry = &registry;
        s.spawn(move || {
            for _ in 0..200 {
                let output = registry.render();
                let value = |prefix: &str| -> f64 {
                    output
                        .lines()
                        .find_map(|line| line.strip_prefix(prefix))
                        .and_then(|v| v.parse().ok())
                        .unwrap()
                };

                let count = value("h_count ");
                assert_eq!(value("h_sum "), count);
                assert_eq!(value("h_bucket{le=\"+Inf\"} "), count);
                assert_eq!(value("h_bucket{le=\"2\"} "), count);
                assert_eq!(value("h_bucket{le=\"0.5\"} "), 0.0);
            }
        });
    });

    assert_eq!(histogram.snapshot().count, 20_000);
}
