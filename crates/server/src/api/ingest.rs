//! Ingestion API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use ingestor_core::{IngestError, IngestionSnapshot, ItemId, Priority};

use crate::state::AppState;

/// Smallest accepted item id
const MIN_ITEM_ID: i64 = 1;

/// Largest accepted item id (10^9 + 7)
const MAX_ITEM_ID: i64 = 1_000_000_007;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting ids
#[derive(Debug, Deserialize)]
pub struct IngestBody {
    /// Item ids, in submission order
    pub ids: Vec<i64>,
    /// HIGH, MEDIUM or LOW
    pub priority: Priority,
    /// Overrides the configured default batch size
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ingestion_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct IngestErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<IngestErrorResponse>);

fn error_reply(status: StatusCode, error: impl Into<String>) -> ErrorReply {
    (
        status,
        Json(IngestErrorResponse {
            error: error.into(),
        }),
    )
}

fn ingest_error_reply(err: IngestError) -> ErrorReply {
    let status = match &err {
        IngestError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IngestError::NotFound(_) => StatusCode::NOT_FOUND,
        IngestError::DuplicateKey(_) | IngestError::Store(_) => {
            error!("Ingestion failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_reply(status, err.to_string())
}

/// Check the id list shape and convert to item ids.
fn validate_ids(ids: &[i64]) -> Result<Vec<ItemId>, String> {
    if ids.is_empty() {
        return Err("At least one ID is required".to_string());
    }
    ids.iter()
        .map(|&id| {
            if (MIN_ITEM_ID..=MAX_ITEM_ID).contains(&id) {
                Ok(id as ItemId)
            } else {
                Err(format!(
                    "ID {} is out of range ({} to {})",
                    id, MIN_ITEM_ID, MAX_ITEM_ID
                ))
            }
        })
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit ids for batched processing
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestResponse>, ErrorReply> {
    let ids = validate_ids(&body.ids)
        .map_err(|e| error_reply(StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let service = state.service();
    let result = match body.batch_size {
        Some(batch_size) => service.submit(&ids, body.priority, batch_size).await,
        None => service.submit_default(&ids, body.priority).await,
    };

    match result {
        Ok(ingestion_id) => Ok(Json(IngestResponse { ingestion_id })),
        Err(e) => Err(ingest_error_reply(e)),
    }
}

/// Get the status of an ingestion and its batches
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IngestionSnapshot>, ErrorReply> {
    state
        .service()
        .get_status(&id)
        .await
        .map(Json)
        .map_err(ingest_error_reply)
}
