//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Submissions (accepted, rejected, batches created)
//! - Dispatch (batches dispatched, finished, queue wait, work duration)
//!
//! Metrics are registered by the server into its registry via [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Submission Metrics
// =============================================================================

/// Accepted ingestions by priority.
pub static INGESTIONS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ingestor_ingestions_submitted_total",
            "Total ingestions accepted",
        ),
        &["priority"],
    )
    .unwrap()
});

/// Rejected submissions.
pub static INGESTIONS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ingestor_ingestions_rejected_total",
        "Total submissions rejected as invalid",
    )
    .unwrap()
});

/// Batches created and enqueued, by priority.
pub static BATCHES_ENQUEUED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ingestor_batches_enqueued_total", "Total batches enqueued"),
        &["priority"],
    )
    .unwrap()
});

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Batches moved to triggered, by priority.
pub static BATCHES_DISPATCHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ingestor_batches_dispatched_total",
            "Total batches dispatched",
        ),
        &["priority"],
    )
    .unwrap()
});

/// Batches settled, by result.
pub static BATCHES_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ingestor_batches_finished_total", "Total batches settled"),
        &["result"], // "completed", "failed", "crashed", "abandoned", "rejected"
    )
    .unwrap()
});

/// Time a batch spent pending before dispatch.
pub static QUEUE_WAIT: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ingestor_batch_queue_wait_seconds",
            "Time between enqueue and dispatch",
        )
        .buckets(vec![
            0.1, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0,
        ]),
        &["priority"],
    )
    .unwrap()
});

/// Duration of the unit of work.
pub static WORK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ingestor_batch_work_duration_seconds",
            "Duration of a batch's unit of work",
        )
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// All core metrics, for registration into a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Submission
        Box::new(INGESTIONS_SUBMITTED.clone()),
        Box::new(INGESTIONS_REJECTED.clone()),
        Box::new(BATCHES_ENQUEUED.clone()),
        // Dispatch
        Box::new(BATCHES_DISPATCHED.clone()),
        Box::new(BATCHES_FINISHED.clone()),
        Box::new(QUEUE_WAIT.clone()),
        Box::new(WORK_DURATION.clone()),
    ]
}
