//! Metrics definitions for the pagination engine.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "paginations_total",
        "Total number of list requests served, by mode and resource"
    );
    describe_counter!(
        "rejected_queries_total",
        "Total number of list requests rejected as client errors"
    );
    describe_counter!(
        "store_errors_total",
        "Total number of list requests that failed in the store"
    );
    describe_histogram!(
        "store_fetch_duration_seconds",
        "Time spent in the store per list request in seconds"
    );
}

/// Record a served list request.
///
/// # Arguments
/// * `mode` - "page" or "cursor"
/// * `resource` - The resource name
pub fn record_pagination(mode: &'static str, resource: &'static str) {
    counter!("paginations_total", "mode" => mode, "resource" => resource).increment(1);
}

/// Record a rejected list request.
pub fn record_rejected_query(kind: &'static str) {
    counter!("rejected_queries_total", "kind" => kind).increment(1);
}

/// Record a store failure.
pub fn record_store_error(resource: &'static str) {
    counter!("store_errors_total", "resource" => resource).increment(1);
}

/// A timer that records store fetch duration when dropped.
pub struct FetchTimer {
    start: Instant,
}

impl FetchTimer {
    /// Start a new fetch timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for FetchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FetchTimer {
    fn drop(&mut self) {
        histogram!("store_fetch_duration_seconds").record(self.start.elapsed().as_secs_f64());
    }
}
