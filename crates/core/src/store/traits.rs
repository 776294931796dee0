//! Status store trait and errors.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::batch::{BatchStatus, IngestionRecord, IngestionSnapshot, IngestionStatus};

/// Errors returned by a [`StatusStore`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No ingestion or batch with this identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// An ingestion or batch with this identifier already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The requested status change is not a forward step.
    #[error("invalid transition for batch {batch_id}: {from} -> {to}")]
    InvalidTransition {
        batch_id: String,
        from: BatchStatus,
        to: BatchStatus,
    },
}

/// Concurrent-safe mapping from ingestion id to its record.
///
/// `update_batch_status` is the only mutation after `put`, and is called only
/// by the dispatcher. Each call is atomic with respect to `get`.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Insert a new record. Fails with `DuplicateKey` if the ingestion id or
    /// any of its batch ids is already known.
    async fn put(&self, record: IngestionRecord) -> Result<(), StoreError>;

    /// Snapshot of a record and all of its batch statuses.
    async fn get(&self, ingestion_id: &str) -> Result<IngestionSnapshot, StoreError>;

    /// Advance one batch's status. Returns the status it held before.
    async fn update_batch_status(
        &self,
        batch_id: &str,
        new_status: BatchStatus,
    ) -> Result<BatchStatus, StoreError>;

    /// Number of stored ingestions.
    async fn count(&self) -> usize;

    /// Number of ingestions per aggregate status.
    async fn counts_by_status(&self) -> HashMap<IngestionStatus, usize>;
}
