//! Dispatch loop implementation.
//!
//! One loop decides what runs next; each batch's unit of work runs on its own
//! task:
//! - Admission: wait for pending work, `RateLimiter::acquire`, then pop the
//!   highest-priority batch
//! - Execution: concurrent, tracked in a `JoinSet`
//! - Settlement: the finished task writes completed/failed to the store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::batch::{BatchStatus, PendingBatch};
use crate::metrics::{BATCHES_DISPATCHED, BATCHES_FINISHED, QUEUE_WAIT, WORK_DURATION};
use crate::scheduler::{PriorityScheduler, RateLimitStatus, RateLimiter};
use crate::store::StatusStore;
use crate::worker::{BatchWorker, WorkError};

use super::config::DispatcherConfig;
use super::types::{DispatchCounters, DispatchError, DispatcherStatus};

/// Callback invoked after every batch status change.
/// Arguments: batch_id, new status.
pub type BatchUpdateCallback = Arc<dyn Fn(&str, BatchStatus) + Send + Sync>;

/// Everything the loop and its tasks share.
#[derive(Clone)]
struct DispatchContext {
    config: DispatcherConfig,
    store: Arc<dyn StatusStore>,
    scheduler: Arc<PriorityScheduler>,
    limiter: Arc<RateLimiter>,
    worker: Arc<dyn BatchWorker>,
    counters: Arc<DispatchCounters>,
    update_callback: Option<BatchUpdateCallback>,
}

/// The dispatcher: sole writer of batch status after submission.
pub struct Dispatcher {
    ctx: DispatchContext,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Create a new dispatcher. Nothing runs until [`Dispatcher::start`].
    pub fn new(
        config: DispatcherConfig,
        store: Arc<dyn StatusStore>,
        scheduler: Arc<PriorityScheduler>,
        limiter: Arc<RateLimiter>,
        worker: Arc<dyn BatchWorker>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            ctx: DispatchContext {
                config,
                store,
                scheduler,
                limiter,
                worker,
                counters: Arc::new(DispatchCounters::default()),
                update_callback: None,
            },
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            loop_handle: Mutex::new(None),
        }
    }

    /// Set a callback to observe batch status changes.
    pub fn with_update_callback(mut self, callback: BatchUpdateCallback) -> Self {
        self.ctx.update_callback = Some(callback);
        self
    }

    /// Start the dispatch loop (spawns a background task).
    pub async fn start(&self) {
        // start() and stop() both hold this lock throughout, so they never
        // interleave and stop() always finds the loop it has to join.
        let mut loop_handle = self.loop_handle.lock().await;
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Dispatcher already running");
            return;
        }

        info!(
            worker = self.ctx.worker.name(),
            window_ms = self.ctx.config.rate_limit_window_ms,
            "Starting dispatcher"
        );

        let shutdown_rx = self.shutdown_tx.subscribe();
        let ctx = self.ctx.clone();
        *loop_handle = Some(tokio::spawn(ctx.run(shutdown_rx)));
    }

    /// Stop the dispatch loop and apply the shutdown policy.
    ///
    /// No new batch is dispatched once this is called. In-flight batches get
    /// `shutdown_grace_ms` to settle; any still running afterwards are
    /// abandoned and marked failed. Returns once every in-flight batch has
    /// settled.
    pub async fn stop(&self) -> Result<(), DispatchError> {
        let mut loop_handle = self.loop_handle.lock().await;
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Dispatcher not running");
            return Ok(());
        }

        info!("Stopping dispatcher");
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = loop_handle.take() {
            handle
                .await
                .map_err(|e| DispatchError::LoopTerminated(e.to_string()))?;
        }

        info!("Dispatcher stopped");
        Ok(())
    }

    /// Rate limiter state, or `None` while the loop is waiting for a permit.
    pub fn rate_limit_status(&self) -> Option<RateLimitStatus> {
        self.ctx.limiter.try_status()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Get current dispatcher status.
    pub fn status(&self) -> DispatcherStatus {
        let counters = &self.ctx.counters;
        DispatcherStatus {
            running: self.is_running(),
            pending: self.ctx.scheduler.len(),
            pending_by_priority: self.ctx.scheduler.depth_by_priority(),
            in_flight: counters.in_flight.load(Ordering::Relaxed),
            dispatched_total: counters.dispatched.load(Ordering::Relaxed),
            completed_total: counters.completed.load(Ordering::Relaxed),
            failed_total: counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl DispatchContext {
    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Dispatch loop started");

        let (abandon_tx, abandon_rx) = watch::channel(false);
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            while let Some(result) = in_flight.try_join_next() {
                log_join_result(result);
            }

            let batch = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Dispatch loop received shutdown signal");
                    break;
                }
                batch = self.admit_next() => batch,
            };

            if let Err(e) = self.trigger(&batch).await {
                // Only reachable if a batch was queued without a stored
                // record, or its status was moved by someone else. Either is
                // a broken invariant, so the batch is dropped, not retried.
                error!(
                    batch_id = %batch.batch_id,
                    ingestion_id = %batch.ingestion_id,
                    "Store rejected trigger, dropping batch: {}", e
                );
                BATCHES_FINISHED.with_label_values(&["rejected"]).inc();
                continue;
            }

            let ctx = self.clone();
            let abandon_rx = abandon_rx.clone();
            in_flight.spawn(async move { ctx.execute(batch, abandon_rx).await });
        }

        self.drain(in_flight, abandon_tx).await;
        info!("Dispatch loop exited");
    }

    /// Wait for pending work, reserve a dispatch slot, then pick the
    /// highest-priority pending batch.
    ///
    /// Permits are only taken while work is pending; a permit spent before
    /// an idle stretch would let two batches start in the same window.
    async fn admit_next(&self) -> PendingBatch {
        loop {
            self.scheduler.ready().await;
            self.limiter.acquire().await;
            // The loop is the only consumer, so the batch seen above is still here.
            if let Some(batch) = self.scheduler.try_next() {
                return batch;
            }
        }
    }

    async fn trigger(&self, batch: &PendingBatch) -> Result<(), DispatchError> {
        self.set_status(&batch.batch_id, BatchStatus::Triggered).await?;

        self.counters.record_dispatch();
        let priority = batch.priority.as_str();
        BATCHES_DISPATCHED.with_label_values(&[priority]).inc();
        QUEUE_WAIT
            .with_label_values(&[priority])
            .observe(batch.enqueued_at.elapsed().as_secs_f64());

        info!(
            batch_id = %batch.batch_id,
            ingestion_id = %batch.ingestion_id,
            priority = %batch.priority,
            items = batch.ids.len(),
            "Batch triggered"
        );
        Ok(())
    }

    async fn execute(self, batch: PendingBatch, abandon_rx: watch::Receiver<bool>) {
        let started = Instant::now();

        // The work gets its own task so a panicking worker still settles.
        let worker = Arc::clone(&self.worker);
        let work_batch = batch.clone();
        let mut work = tokio::spawn(async move { worker.process(&work_batch).await });

        let result = tokio::select! {
            joined = &mut work => joined.unwrap_or_else(|e| {
                Err(WorkError::Crashed {
                    batch_id: batch.batch_id.clone(),
                    reason: e.to_string(),
                })
            }),
            _ = abandoned(abandon_rx) => {
                work.abort();
                Err(WorkError::Abandoned {
                    batch_id: batch.batch_id.clone(),
                })
            }
        };

        let (status, label) = match &result {
            Ok(()) => (BatchStatus::Completed, "completed"),
            Err(WorkError::Abandoned { .. }) => (BatchStatus::Failed, "abandoned"),
            Err(WorkError::Crashed { .. }) => (BatchStatus::Failed, "crashed"),
            Err(_) => (BatchStatus::Failed, "failed"),
        };

        if let Err(e) = &result {
            warn!(batch_id = %batch.batch_id, "Batch did not complete: {}", e);
        }

        WORK_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());
        BATCHES_FINISHED.with_label_values(&[label]).inc();

        match self.set_status(&batch.batch_id, status).await {
            Ok(()) => debug!(batch_id = %batch.batch_id, status = %status, "Batch settled"),
            Err(e) => error!(batch_id = %batch.batch_id, "Failed to settle batch: {}", e),
        }
        self.counters.record_settled(status == BatchStatus::Completed);
    }

    /// Wait out the grace period, then abandon whatever is still running.
    async fn drain(&self, mut in_flight: JoinSet<()>, abandon_tx: watch::Sender<bool>) {
        if in_flight.is_empty() {
            return;
        }

        let grace = self.config.shutdown_grace();
        info!(
            count = in_flight.len(),
            grace_ms = grace.as_millis() as u64,
            "Waiting for in-flight batches"
        );

        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = in_flight.join_next().await {
                log_join_result(result);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                count = in_flight.len(),
                "Shutdown grace period elapsed, abandoning in-flight batches"
            );
            let _ = abandon_tx.send(true);
            while let Some(result) = in_flight.join_next().await {
                log_join_result(result);
            }
        }
    }

    async fn set_status(&self, batch_id: &str, status: BatchStatus) -> Result<(), DispatchError> {
        self.store.update_batch_status(batch_id, status).await?;
        if let Some(ref callback) = self.update_callback {
            callback(batch_id, status);
        }
        Ok(())
    }
}

/// Resolves once the loop asks in-flight work to give up.
async fn abandoned(mut abandon_rx: watch::Receiver<bool>) {
    loop {
        let abandon = *abandon_rx.borrow_and_update();
        if abandon {
            return;
        }
        if abandon_rx.changed().await.is_err() {
            // Loop is gone; treat as abandoned.
            return;
        }
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("Batch task terminated abnormally: {}", e);
    }
}
