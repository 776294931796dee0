//! In-process status store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StatusStore, StoreError};
use crate::batch::{BatchStatus, IngestionRecord, IngestionSnapshot, IngestionStatus};

/// Location of a batch inside the record map.
#[derive(Debug, Clone)]
struct BatchLocation {
    ingestion_id: String,
    index: usize,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, IngestionRecord>,
    batch_index: HashMap<String, BatchLocation>,
}

/// Status store backed by in-memory maps.
///
/// Records and the batch index live behind one lock, so a status update and
/// the index lookup that found it are a single atomic step for readers.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    inner: RwLock<Inner>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn put(&self, record: IngestionRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if inner.records.contains_key(&record.ingestion_id) {
            return Err(StoreError::DuplicateKey(record.ingestion_id));
        }
        if let Some(batch) = record
            .batches
            .iter()
            .find(|b| inner.batch_index.contains_key(&b.batch_id))
        {
            return Err(StoreError::DuplicateKey(batch.batch_id.clone()));
        }

        for (index, batch) in record.batches.iter().enumerate() {
            inner.batch_index.insert(
                batch.batch_id.clone(),
                BatchLocation {
                    ingestion_id: record.ingestion_id.clone(),
                    index,
                },
            );
        }
        inner.records.insert(record.ingestion_id.clone(), record);

        Ok(())
    }

    async fn get(&self, ingestion_id: &str) -> Result<IngestionSnapshot, StoreError> {
        let inner = self.inner.read().await;
        inner
            .records
            .get(ingestion_id)
            .map(IngestionRecord::snapshot)
            .ok_or_else(|| StoreError::NotFound(ingestion_id.to_string()))
    }

    async fn update_batch_status(
        &self,
        batch_id: &str,
        new_status: BatchStatus,
    ) -> Result<BatchStatus, StoreError> {
        let mut inner = self.inner.write().await;

        let location = inner
            .batch_index
            .get(batch_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(batch_id.to_string()))?;

        let batch = inner
            .records
            .get_mut(&location.ingestion_id)
            .and_then(|record| record.batches.get_mut(location.index))
            .ok_or_else(|| StoreError::NotFound(batch_id.to_string()))?;

        let previous = batch.status;
        if !previous.can_transition_to(new_status) {
            return Err(StoreError::InvalidTransition {
                batch_id: batch_id.to_string(),
                from: previous,
                to: new_status,
            });
        }
        batch.status = new_status;

        Ok(previous)
    }

    async fn count(&self) -> usize {
        self.inner.read().await.records.len()
    }

    async fn counts_by_status(&self) -> HashMap<IngestionStatus, usize> {
        let inner = self.inner.read().await;
        let mut counts = HashMap::new();
        for record in inner.records.values() {
            *counts.entry(record.status()).or_insert(0) += 1;
        }
        counts
    }
}
