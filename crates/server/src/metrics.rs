//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the vidscan server:
//! - HTTP request metrics (latency, counts, errors)
//! - Active job gauge (collected dynamically)
//! - Core orchestrator and inference metrics (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidscan_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidscan_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidscan_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Jobs with a live registry entry.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidscan_jobs_active",
        "Number of jobs currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Jobs
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();

    // Core metrics (orchestrator, inference)
    for metric in vidscan_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    JOBS_ACTIVE.set(state.orchestrator().status().active_jobs as i64);
}

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/-?\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_REGEX.replace_all(path, "{id}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(
            normalize_path("/api/detection/result/12345"),
            "/api/detection/result/{id}"
        );
        assert_eq!(
            normalize_path("/api/detection/cancel/7"),
            "/api/detection/cancel/{id}"
        );
    }

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/files/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/files/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/detection/video"), "/api/detection/video");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("vidscan_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vectors that have at least one label set
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        JOBS_ACTIVE.set(0);
        vidscan_core::metrics::JOBS_SUBMITTED
            .with_label_values(&["VIDEO"])
            .inc_by(0);
        vidscan_core::metrics::JOBS_CANCELED.inc_by(0);

        let output = encode_metrics();

        assert!(output.contains("vidscan_http_request_duration_seconds"));
        assert!(output.contains("vidscan_http_requests_in_flight"));
        assert!(output.contains("vidscan_jobs_active"));
        assert!(output.contains("vidscan_jobs_submitted_total"));
        assert!(output.contains("vidscan_jobs_canceled_total"));
    }
}
