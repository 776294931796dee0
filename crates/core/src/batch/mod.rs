//! Batches, ingestion records, and the partitioning of submitted ids.

mod partition;
mod types;

pub use partition::{partition, SequenceCounter};
pub use types::{
    Batch, BatchSnapshot, BatchStatus, IngestionRecord, IngestionSnapshot, IngestionStatus,
    ItemId, PendingBatch, Priority,
};
