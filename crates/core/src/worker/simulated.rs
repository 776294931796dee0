//! Simulated external call.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{BatchWorker, WorkError};
use crate::batch::PendingBatch;

/// Stands in for the external API: waits a fixed delay, then succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedWorker {
    delay: Duration,
}

impl SimulatedWorker {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl BatchWorker for SimulatedWorker {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn process(&self, batch: &PendingBatch) -> Result<(), WorkError> {
        tokio::time::sleep(self.delay).await;
        debug!(
            batch_id = %batch.batch_id,
            items = batch.ids.len(),
            "Simulated external call processed batch"
        );
        Ok(())
    }
}
