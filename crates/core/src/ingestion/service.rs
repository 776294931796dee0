//! Submission and status queries.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};

use crate::batch::{
    partition, IngestionRecord, IngestionSnapshot, ItemId, PendingBatch, Priority,
    SequenceCounter,
};
use crate::metrics::{BATCHES_ENQUEUED, INGESTIONS_REJECTED, INGESTIONS_SUBMITTED};
use crate::scheduler::PriorityScheduler;
use crate::store::{StatusStore, StoreError};

use super::config::IngestionConfig;

/// Errors returned to callers of the ingestion service.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request was rejected; nothing was stored.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No ingestion with this identifier.
    #[error("ingestion not found: {0}")]
    NotFound(String),

    /// Identifier collision. Indicates a broken id generator.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Any other store failure.
    #[error("status store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => IngestError::NotFound(id),
            StoreError::DuplicateKey(id) => IngestError::DuplicateKey(id),
            other => IngestError::Store(other),
        }
    }
}

/// Boundary between the transport layer and the batch scheduler.
pub struct IngestionService {
    config: IngestionConfig,
    store: Arc<dyn StatusStore>,
    scheduler: Arc<PriorityScheduler>,
    sequence: SequenceCounter,
}

impl IngestionService {
    pub fn new(
        config: IngestionConfig,
        store: Arc<dyn StatusStore>,
        scheduler: Arc<PriorityScheduler>,
    ) -> Self {
        Self {
            config,
            store,
            scheduler,
            sequence: SequenceCounter::new(),
        }
    }

    /// Accept `ids`, split them into batches of at most `batch_size`, and
    /// queue every batch at `priority`.
    ///
    /// The record is stored before its batches are enqueued, so the
    /// dispatcher only ever sees batches the store knows about.
    pub async fn submit(
        &self,
        ids: &[ItemId],
        priority: Priority,
        batch_size: usize,
    ) -> Result<String, IngestError> {
        if let Err(e) = self.validate(ids, batch_size) {
            INGESTIONS_REJECTED.inc();
            return Err(e);
        }

        let ingestion_id = uuid::Uuid::new_v4().to_string();
        let batches = partition(ids, batch_size, &self.sequence);
        let pending: Vec<PendingBatch> = batches
            .iter()
            .map(|batch| PendingBatch::from_batch(batch, &ingestion_id, priority))
            .collect();
        let batch_count = batches.len();

        let record = IngestionRecord {
            ingestion_id: ingestion_id.clone(),
            priority,
            batches,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.put(record).await {
            error!(ingestion_id = %ingestion_id, "Failed to store ingestion: {}", e);
            return Err(e.into());
        }

        self.scheduler.enqueue_all(pending);

        INGESTIONS_SUBMITTED
            .with_label_values(&[priority.as_str()])
            .inc();
        BATCHES_ENQUEUED
            .with_label_values(&[priority.as_str()])
            .inc_by(batch_count as u64);

        info!(
            ingestion_id = %ingestion_id,
            priority = %priority,
            items = ids.len(),
            batches = batch_count,
            "Ingestion accepted"
        );

        Ok(ingestion_id)
    }

    /// [`submit`](Self::submit) with the configured default batch size.
    pub async fn submit_default(
        &self,
        ids: &[ItemId],
        priority: Priority,
    ) -> Result<String, IngestError> {
        self.submit(ids, priority, self.config.default_batch_size)
            .await
    }

    /// Current status of an ingestion and each of its batches.
    pub async fn get_status(&self, ingestion_id: &str) -> Result<IngestionSnapshot, IngestError> {
        Ok(self.store.get(ingestion_id).await?)
    }

    fn validate(&self, ids: &[ItemId], batch_size: usize) -> Result<(), IngestError> {
        if ids.is_empty() {
            return Err(IngestError::InvalidInput(
                "at least one id is required".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(IngestError::InvalidInput(
                "batch_size must be positive".to_string(),
            ));
        }
        if batch_size > self.config.max_batch_size {
            return Err(IngestError::InvalidInput(format!(
                "batch_size {} exceeds maximum {}",
                batch_size, self.config.max_batch_size
            )));
        }
        Ok(())
    }
}
