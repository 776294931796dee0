//! Types for the dispatcher.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::Priority;
use crate::store::StoreError;

/// Errors that can occur while dispatching.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Status store rejected a transition.
    #[error("status store error: {0}")]
    Store(#[from] StoreError),

    /// The dispatch loop task panicked or was aborted.
    #[error("dispatch loop terminated abnormally: {0}")]
    LoopTerminated(String),
}

/// Cumulative dispatch counters, shared between the loop and its tasks.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    pub in_flight: AtomicUsize,
    pub dispatched: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
}

impl DispatchCounters {
    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settled(&self, completed: bool) {
        if completed {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Current status of the dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatcherStatus {
    /// Whether the dispatch loop is running.
    pub running: bool,
    /// Batches waiting in the scheduler.
    pub pending: usize,
    /// Pending batches per tier, highest priority first.
    pub pending_by_priority: Vec<(Priority, usize)>,
    /// Batches whose unit of work is running.
    pub in_flight: usize,
    /// Batches moved to triggered since startup.
    pub dispatched_total: u64,
    /// Batches settled as completed since startup.
    pub completed_total: u64,
    /// Batches settled as failed since startup.
    pub failed_total: u64,
}
