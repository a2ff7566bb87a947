//! eventmeter - a minimal HTTP event API with built-in metrics
//!
//! The interesting part of this crate is the [`metrics`] module:
//! - Lock-free counters and mutex-guarded cumulative histograms
//! - A registry with find-or-create registration by name
//! - Deterministic Prometheus text exposition
//!
//! The [`server`] module is a thin hyper service that updates the request
//! metrics on every call and serves the scrape endpoint.

pub mod config;
pub mod metrics;
pub mod server;
pub mod state;
pub mod util;

pub use config::Config;
pub use metrics::MetricRegistry;
