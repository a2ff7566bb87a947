//! Text exposition format encoder.
//!
//! Output layout per metric family:
//!
//! ```text
//! # HELP <name> <help>
//! # TYPE <name> counter
//! <name> <value>
//! ```
//!
//! Histograms emit one `<name>_bucket{le="..."}` line per bound plus `+Inf`,
//! followed by `<name>_sum` and `<name>_count`. Families are separated by a
//! blank line.

use crate::metrics::{Counter, Histogram, Metric};
use std::fmt::{self, Write};

/// Content type for the scrape endpoint.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encode `metrics` in order into `writer`.
pub fn encode<W: Write>(writer: &mut W, metrics: &[Metric]) -> fmt::Result {
    for (i, metric) in metrics.iter().enumerate() {
        if i > 0 {
            writer.write_char('\n')?;
        }
        encode_header(writer, metric)?;
        match metric {
            Metric::Counter(counter) => encode_counter(writer, counter)?,
            Metric::Histogram(histogram) => encode_histogram(writer, histogram)?,
        }
    }
    Ok(())
}

fn encode_header<W: Write>(writer: &mut W, metric: &Metric) -> fmt::Result {
    writeln!(
        writer,
        "# HELP {} {}",
        metric.name(),
        escape_help(metric.help())
    )?;
    writeln!(writer, "# TYPE {} {}", metric.name(), metric.kind())
}

fn encode_counter<W: Write>(writer: &mut W, counter: &Counter) -> fmt::Result {
    writeln!(writer, "{} {}", counter.name(), format_value(counter.value()))
}

fn encode_histogram<W: Write>(writer: &mut W, histogram: &Histogram) -> fmt::Result {
    let name = histogram.name();
    let snapshot = histogram.snapshot();

    for (bound, count) in snapshot.bounds.iter().zip(&snapshot.cumulative_counts) {
        writeln!(
            writer,
            "{}_bucket{{le=\"{}\"}} {}",
            name,
            format_value(*bound),
            count
        )?;
    }
    writeln!(writer, "{}_bucket{{le=\"+Inf\"}} {}", name, snapshot.count)?;
    writeln!(writer, "{}_sum {}", name, format_value(snapshot.sum))?;
    writeln!(writer, "{}_count {}", name, snapshot.count)
}

/// Format a sample value.
///
/// Finite values use the shortest representation that parses back to the
/// same `f64`, without an exponent (`42`, `0.1`, `2.45`).
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Escape help text so it stays on one line.
fn escape_help(help: &str) -> String {
    let mut escaped = String::with_capacity(help.len());
    for c in help.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricRegistry;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(0.005), "0.005");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_value_round_trips() {
        for value in [0.1 + 0.2, 1.0 / 3.0, 1e-9, 123456789.123, 1e21] {
            let parsed: f64 = format_value(value).parse().unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn test_escape_help() {
        assert_eq!(escape_help("plain"), "plain");
        assert_eq!(escape_help("a\\b"), "a\\\\b");
        assert_eq!(escape_help("line1\nline2"), "line1\\nline2");
    }

    #[test]
    fn test_encode_histogram() {
        let registry = MetricRegistry::new();
        let histogram = registry
            .histogram_with_buckets("latency_seconds", "Latency", &[0.1, 0.5, 1.0])
            .unwrap();
        for value in [0.05, 0.2, 0.2, 2.0] {
            histogram.observe(value);
        }

        let output = registry.render();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "# HELP latency_seconds Latency");
        assert_eq!(lines[1], "# TYPE latency_seconds histogram");
        assert_eq!(lines[2], "latency_seconds_bucket{le=\"0.1\"} 1");
        assert_eq!(lines[3], "latency_seconds_bucket{le=\"0.5\"} 3");
        assert_eq!(lines[4], "latency_seconds_bucket{le=\"1\"} 3");
        assert_eq!(lines[5], "latency_seconds_bucket{le=\"+Inf\"} 4");
        assert!(lines[6].starts_with("latency_seconds_sum "));
        assert_eq!(lines[7], "latency_seconds_count 4");
        assert_eq!(lines.len(), 8);

        let sum: f64 = lines[6]["latency_seconds_sum ".len()..].parse().unwrap();
        assert_eq!(sum, histogram.snapshot().sum);
    }

    #[test]
    fn test_families_separated_by_blank_line() {
        let registry = MetricRegistry::new();
        registry.counter("a_total", "A").unwrap().inc();
        registry.counter("b_total", "B").unwrap();

        assert_eq!(
            registry.render(),
            "# HELP a_total A\n# TYPE a_total counter\na_total 1\n\
             \n\
             # HELP b_total B\n# TYPE b_total counter\nb_total 0\n"
        );
    }

    #[test]
    fn test_help_with_newline_stays_on_one_line() {
        let registry = MetricRegistry::new();
        registry.counter("c_total", "first\nsecond").unwrap();

        let output = registry.render();
        assert!(output.starts_with("# HELP c_total first\\nsecond\n"));
        assert_eq!(output.lines().count(), 3);
    }
}
