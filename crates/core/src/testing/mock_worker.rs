//! Mock batch worker for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::batch::{ItemId, PendingBatch, Priority};
use crate::worker::{BatchWorker, WorkError};

/// A recorded unit of work for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedWork {
    pub batch_id: String,
    pub ingestion_id: String,
    pub priority: Priority,
    pub ids: Vec<ItemId>,
    /// When the work started (tokio clock, so it follows paused time).
    pub started_at: Instant,
}

/// Mock implementation of the BatchWorker trait.
///
/// Provides controllable behavior for testing:
/// - Track every batch in the order its work started
/// - Simulate work duration
/// - Fail batches containing chosen item ids
/// - Panic on batches containing chosen item ids
///
/// # Example
///
/// ```rust,ignore
/// use ingestor_core::testing::MockWorker;
///
/// let worker = MockWorker::new();
/// worker.set_duration(Duration::from_millis(10)).await;
/// worker.fail_items(&[42]).await;
///
/// // ... run the dispatcher ...
///
/// let order: Vec<_> = worker.recorded().await.into_iter().map(|w| w.batch_id).collect();
/// ```
#[derive(Debug, Clone)]
pub struct MockWorker {
    /// Recorded work, in start order.
    recorded: Arc<RwLock<Vec<RecordedWork>>>,
    /// Simulated work duration in milliseconds.
    duration_ms: Arc<RwLock<u64>>,
    /// Batches containing any of these ids fail.
    failing_items: Arc<RwLock<HashSet<ItemId>>>,
    /// Batches containing any of these ids panic mid-work.
    panicking_items: Arc<RwLock<HashSet<ItemId>>>,
}

impl Default for MockWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorker {
    /// Create a new mock worker that finishes instantly.
    pub fn new() -> Self {
        Self {
            recorded: Arc::new(RwLock::new(Vec::new())),
            duration_ms: Arc::new(RwLock::new(0)),
            failing_items: Arc::new(RwLock::new(HashSet::new())),
            panicking_items: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Get all recorded work, in start order.
    pub async fn recorded(&self) -> Vec<RecordedWork> {
        self.recorded.read().await.clone()
    }

    /// Get the number of batches processed or in progress.
    pub async fn work_count(&self) -> usize {
        self.recorded.read().await.len()
    }

    /// Set the simulated work duration.
    pub async fn set_duration(&self, duration: Duration) {
        *self.duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Make every batch containing one of `ids` fail.
    pub async fn fail_items(&self, ids: &[ItemId]) {
        self.failing_items.write().await.extend(ids.iter().copied());
    }

    /// Make every batch containing one of `ids` panic after its duration.
    pub async fn panic_items(&self, ids: &[ItemId]) {
        self.panicking_items.write().await.extend(ids.iter().copied());
    }
}

#[async_trait]
impl BatchWorker for MockWorker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn process(&self, batch: &PendingBatch) -> Result<(), WorkError> {
        self.recorded.write().await.push(RecordedWork {
            batch_id: batch.batch_id.clone(),
            ingestion_id: batch.ingestion_id.clone(),
            priority: batch.priority,
            ids: batch.ids.to_vec(),
            started_at: Instant::now(),
        });

        let duration_ms = *self.duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        let panicking = self.panicking_items.read().await;
        if let Some(id) = batch.ids.iter().find(|id| panicking.contains(*id)) {
            panic!("mock worker panicked on item {}", id);
        }
        drop(panicking);

        let failing = self.failing_items.read().await;
        if let Some(id) = batch.ids.iter().find(|id| failing.contains(*id)) {
            return Err(WorkError::Failed {
                batch_id: batch.batch_id.clone(),
                reason: format!("item {} rejected", id),
            });
        }

        Ok(())
    }
}
