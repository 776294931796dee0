//! Dispatcher API handlers.

use axum::{extract::State, Json};
use ingestor_core::{DispatcherStatus, Priority};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Dispatcher status response
#[derive(Debug, Serialize)]
pub struct DispatcherStatusResponse {
    /// Whether the dispatch loop is running
    pub running: bool,
    /// Batches waiting to be dispatched
    pub pending: usize,
    pub pending_high: usize,
    pub pending_medium: usize,
    pub pending_low: usize,
    /// Batches whose work is running
    pub in_flight: usize,
    pub dispatched_total: u64,
    pub completed_total: u64,
    pub failed_total: u64,
    /// True while the loop is waiting for the next dispatch slot
    pub rate_limited: bool,
    /// Milliseconds until the next dispatch slot, when known
    pub next_slot_in_ms: Option<u64>,
}

fn pending_for(status: &DispatcherStatus, priority: Priority) -> usize {
    status
        .pending_by_priority
        .iter()
        .find(|(p, _)| *p == priority)
        .map(|(_, n)| *n)
        .unwrap_or(0)
}

// ============================================================================
// Handlers
// ============================================================================

/// Get dispatcher status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<DispatcherStatusResponse> {
    let dispatcher = state.dispatcher();
    let status = dispatcher.status();

    // The limiter is locked while the loop sleeps for a permit
    let (rate_limited, next_slot_in_ms) = match dispatcher.rate_limit_status() {
        Some(limit) => (
            limit.next_available_in_ms.is_some(),
            limit.next_available_in_ms,
        ),
        None => (true, None),
    };

    Json(DispatcherStatusResponse {
        running: status.running,
        pending: status.pending,
        pending_high: pending_for(&status, Priority::High),
        pending_medium: pending_for(&status, Priority::Medium),
        pending_low: pending_for(&status, Priority::Low),
        in_flight: status.in_flight,
        dispatched_total: status.dispatched_total,
        completed_total: status.completed_total,
        failed_total: status.failed_total,
        rate_limited,
        next_slot_in_ms,
    })
}
