//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ingestor server:
//! - HTTP request metrics (latency, counts)
//! - Dispatcher and queue state (collected dynamically)
//! - Ingestions by aggregate status (collected dynamically)
//!
//! Submission and dispatch counters live in `ingestor_core::metrics` and are
//! registered here.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use ingestor_core::IngestionStatus;

use crate::state::AppState;

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
            "ingestor_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ingestor_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ingestor_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Dispatcher Metrics (collected dynamically)
// =============================================================================

/// Dispatcher running state (1 = running, 0 = stopped).
pub static DISPATCHER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ingestor_dispatcher_running",
        "Whether the dispatcher is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Pending batches by priority.
pub static BATCHES_PENDING: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("ingestor_batches_pending", "Batches waiting to be dispatched"),
        &["priority"],
    )
    .unwrap()
});

/// Batches whose work is running.
pub static BATCHES_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ingestor_batches_in_flight",
        "Number of batches whose work is running",
    )
    .unwrap()
});

// =============================================================================
// Ingestion Metrics (collected dynamically)
// =============================================================================

/// Ingestions by current aggregate status.
pub static INGESTIONS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "ingestor_ingestions_by_status",
            "Current ingestion count by aggregate status",
        ),
        &["status"],
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

    // Dispatcher
    registry
        .register(Box::new(DISPATCHER_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(BATCHES_PENDING.clone()))
        .unwrap();
    registry
        .register(Box::new(BATCHES_IN_FLIGHT.clone()))
        .unwrap();

    // Ingestions
    registry
        .register(Box::new(INGESTIONS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (submissions, dispatch)
    for metric in ingestor_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the dispatcher and the status store.
pub async fn collect_dynamic_metrics(state: &AppState) {
    // Update dispatcher metrics
    let status = state.dispatcher().status();
    DISPATCHER_RUNNING.set(if status.running { 1 } else { 0 });
    BATCHES_IN_FLIGHT.set(status.in_flight as i64);
    for (priority, depth) in &status.pending_by_priority {
        BATCHES_PENDING
            .with_label_values(&[priority.as_str()])
            .set(*depth as i64);
    }

    // Update ingestion counts by status
    let counts = state.store().counts_by_status().await;
    for status in [
        IngestionStatus::YetToStart,
        IngestionStatus::Triggered,
        IngestionStatus::Completed,
        IngestionStatus::Failed,
    ] {
        let count = counts.get(&status).copied().unwrap_or(0);
        INGESTIONS_BY_STATUS
            .with_label_values(&[status.as_str()])
            .set(count as i64);
    }
}

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_REGEX.replace_all(path, "{id}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{id}$1");
    result.to_string()
}
