//! Trait definitions for the worker module.

use async_trait::async_trait;

use super::error::WorkError;
use crate::batch::PendingBatch;

/// Performs the external unit of work for one dispatched batch.
///
/// The dispatcher runs each call on its own task, so implementations may take
/// as long as they need without holding up dispatch of other batches.
#[async_trait]
pub trait BatchWorker: Send + Sync {
    /// Returns the name of this worker implementation.
    fn name(&self) -> &str;

    /// Process every item of `batch`. An error settles the batch as failed.
    async fn process(&self, batch: &PendingBatch) -> Result<(), WorkError>;
}
