//! Configuration validation.

use crate::config::Config;
use crate::metrics::{REQUEST_LATENCY_SECONDS, validate_buckets};
use crate::server::RESERVED_PATHS;

/// Validate the configuration.
///
/// Checks for:
/// - A known log level
/// - A metrics path that is absolute and does not shadow a built-in route
/// - Latency buckets the histogram would accept
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    // Validate metrics path
    let path = &config.metrics.path;
    if !path.starts_with('/') {
        errors.push(format!("metrics path '{}' must start with '/'", path));
    } else if RESERVED_PATHS.contains(&path.as_str()) {
        errors.push(format!(
            "metrics path '{}' conflicts with a built-in route",
            path
        ));
    }

    // Validate latency buckets
    if let Some(ref buckets) = config.metrics.latency_buckets {
        if let Err(e) = validate_buckets(REQUEST_LATENCY_SECONDS, buckets) {
            errors.push(e.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.global.log_level = "verbose".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("invalid log level"));
    }

    #[test]
    fn test_relative_metrics_path() {
        let mut config = Config::default();
        config.metrics.path = "metrics".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("must start with '/'"));
    }

    #[test]
    fn test_metrics_path_shadows_route() {
        let mut config = Config::default();
        config.metrics.path = "/health".to_string();
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("built-in route"));
    }

    #[test]
    fn test_invalid_latency_buckets() {
        let mut config = Config::default();
        config.metrics.latency_buckets = Some(vec![1.0, 0.5]);
        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("strictly increasing"));

        config.metrics.latency_buckets = Some(vec![]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = Config::default();
        config.global.log_level = "loud".to_string();
        config.metrics.path = "nope".to_string();
        let message = validate_config(&config).unwrap_err();
        assert!(message.contains("invalid log level"));
        assert!(message.contains("must start with '/'"));
    }
}
