//! Splitting an id list into fixed-size batches.

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{Batch, ItemId};

/// Source of batch sequence numbers.
///
/// One counter is shared by every submission so that sequence numbers are
/// globally increasing in creation order.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `count` consecutive sequence numbers and return the first.
    pub fn reserve(&self, count: u64) -> u64 {
        self.next.fetch_add(count, Ordering::Relaxed)
    }
}

/// Split `ids` into consecutive batches of at most `batch_size` items.
///
/// Order is preserved and every id lands in exactly one batch. Each batch gets
/// a fresh UUID and a sequence number from `counter`, contiguous within this
/// call. Callers must reject an empty `ids` or a zero `batch_size` first.
pub fn partition(ids: &[ItemId], batch_size: usize, counter: &SequenceCounter) -> Vec<Batch> {
    debug_assert!(batch_size > 0, "batch_size must be positive");
    let batch_size = batch_size.max(1);

    let chunk_count = ids.len().div_ceil(batch_size);
    let first_sequence = counter.reserve(chunk_count as u64);

    ids.chunks(batch_size)
        .enumerate()
        .map(|(offset, chunk)| {
            Batch::new(
                uuid::Uuid::new_v4().to_string(),
                chunk.to_vec(),
                first_sequence + offset as u64,
            )
        })
        .collect()
}
