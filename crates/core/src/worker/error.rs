//! Error types for the worker module.

use thiserror::Error;

/// Errors a unit of work can report.
#[derive(Debug, Error)]
pub enum WorkError {
    /// The external call rejected the batch.
    #[error("work failed for batch {batch_id}: {reason}")]
    Failed { batch_id: String, reason: String },

    /// The work task died before reporting a result.
    #[error("work crashed for batch {batch_id}: {reason}")]
    Crashed { batch_id: String, reason: String },

    /// The work was cut short at shutdown.
    #[error("work abandoned for batch {batch_id}")]
    Abandoned { batch_id: String },
}
