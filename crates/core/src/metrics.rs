//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (submissions, completions, cancellations)
//! - Inference service calls

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Jobs submitted total by query type.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidscan_jobs_submitted_total", "Total jobs submitted"),
        &["type"], // "VIDEO", "STREAM"
    )
    .unwrap()
});

/// Submissions rejected before a job was dispatched.
pub static SUBMISSIONS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidscan_submissions_failed_total",
            "Total submissions that failed before dispatch",
        ),
        &["reason"], // "blob_upload", "record_insert", "invalid_source"
    )
    .unwrap()
});

/// Jobs finished total by resolved status.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidscan_jobs_finished_total", "Total jobs finished"),
        &["status"], // "SUCCESS", "ERROR", "CANCELED", "UNRECOGNIZED"
    )
    .unwrap()
});

/// Explicit cancel requests that found an in-flight job.
pub static JOBS_CANCELED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidscan_jobs_canceled_total",
        "Total jobs canceled by request",
    )
    .unwrap()
});

/// Final status writes that failed.
pub static STATUS_WRITE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidscan_status_write_failures_total",
        "Total response status writes that failed",
    )
    .unwrap()
});

/// Job duration in seconds, from dispatch to the remote call returning.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("vidscan_job_duration_seconds", "Duration of detection jobs").buckets(
            vec![1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 3600.0, 14400.0],
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// Inference service requests total.
pub static INFERENCE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidscan_inference_requests_total",
            "Total inference service requests",
        ),
        &["operation", "status"], // status: "success", "error", "canceled"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(SUBMISSIONS_FAILED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_CANCELED.clone()),
        Box::new(STATUS_WRITE_FAILURES.clone()),
        Box::new(JOB_DURATION.clone()),
        // External services
        Box::new(INFERENCE_REQUESTS.clone()),
    ]
}
