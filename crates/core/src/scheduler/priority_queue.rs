//! Priority-ordered queue of pending batches.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

use crate::batch::{PendingBatch, Priority};

/// Pending batches, one tier per priority, each keyed by sequence number.
#[derive(Debug, Default)]
struct Tiers {
    queues: [BTreeMap<u64, PendingBatch>; 3],
}

impl Tiers {
    fn insert(&mut self, batch: PendingBatch) {
        let tier = &mut self.queues[batch.priority.tier_index()];
        tier.insert(batch.sequence_number, batch);
    }

    fn pop(&mut self) -> Option<PendingBatch> {
        self.queues
            .iter_mut()
            .find_map(|tier| tier.pop_first().map(|(_, batch)| batch))
    }

    fn len(&self) -> usize {
        self.queues.iter().map(BTreeMap::len).sum()
    }
}

/// Holds every pending batch across all ingestions.
///
/// `next` yields the batch with the highest priority, and within a tier the
/// lowest sequence number. Any number of tasks may enqueue concurrently.
#[derive(Debug, Default)]
pub struct PriorityScheduler {
    tiers: Mutex<Tiers>,
    notify: Notify,
}

impl PriorityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tiers> {
        // Critical sections never panic midway, so a poisoned guard is still consistent.
        self.tiers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one pending batch.
    pub fn enqueue(&self, batch: PendingBatch) {
        debug!(
            batch_id = %batch.batch_id,
            priority = %batch.priority,
            sequence = batch.sequence_number,
            "Enqueued batch"
        );
        self.lock().insert(batch);
        self.notify.notify_one();
    }

    /// Add every batch of one submission under a single lock acquisition.
    pub fn enqueue_all<I>(&self, batches: I)
    where
        I: IntoIterator<Item = PendingBatch>,
    {
        let mut added = 0usize;
        {
            let mut tiers = self.lock();
            for batch in batches {
                tiers.insert(batch);
                added += 1;
            }
        }
        if added > 0 {
            debug!(count = added, "Enqueued batches");
            self.notify.notify_one();
        }
    }

    /// Remove and return the next batch without waiting.
    pub fn try_next(&self) -> Option<PendingBatch> {
        self.lock().pop()
    }

    /// Remove and return the next batch, waiting until one is available.
    ///
    /// Cancel-safe: a batch is removed only when this future completes.
    pub async fn next(&self) -> PendingBatch {
        loop {
            self.ready().await;
            if let Some(batch) = self.try_next() {
                return batch;
            }
        }
    }

    /// Wait until at least one batch is pending, without removing it.
    pub async fn ready(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so an enqueue between the check and
            // the await still wakes us.
            notified.as_mut().enable();

            if !self.is_empty() {
                return;
            }

            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending batch count per tier, highest priority first.
    pub fn depth_by_priority(&self) -> Vec<(Priority, usize)> {
        let tiers = self.lock();
        Priority::ALL
            .iter()
            .map(|p| (*p, tiers.queues[p.tier_index()].len()))
            .collect()
    }
}
