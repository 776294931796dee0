//! Batch and ingestion record types.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item identifier carried by a batch.
pub type ItemId = u64;

/// Dispatch precedence of an ingestion and all of its batches.
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// All tiers, highest first. This is the scan order of the scheduler.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    /// Position of this tier in [`Priority::ALL`].
    pub(crate) fn tier_index(&self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing status of a single batch.
///
/// Advances `YetToStart -> Triggered -> Completed | Failed` and never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    YetToStart,
    Triggered,
    Completed,
    /// The unit of work reported an error or was abandoned at shutdown.
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::YetToStart => "yet_to_start",
            BatchStatus::Triggered => "triggered",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal forward step.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::YetToStart, BatchStatus::Triggered)
                | (BatchStatus::Triggered, BatchStatus::Completed)
                | (BatchStatus::Triggered, BatchStatus::Failed)
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate status of an ingestion, derived from its batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    YetToStart,
    Triggered,
    Completed,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::YetToStart => "yet_to_start",
            IngestionStatus::Triggered => "triggered",
            IngestionStatus::Completed => "completed",
            IngestionStatus::Failed => "failed",
        }
    }

    /// Derive the aggregate from batch statuses.
    ///
    /// - every batch `yet_to_start` → `yet_to_start`
    /// - every batch `completed` → `completed`
    /// - every batch terminal with at least one `failed` → `failed`
    /// - anything else → `triggered`
    pub fn from_batches<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = BatchStatus>,
    {
        let mut all_pending = true;
        let mut all_completed = true;
        let mut all_terminal = true;

        for status in statuses {
            all_pending &= status == BatchStatus::YetToStart;
            all_completed &= status == BatchStatus::Completed;
            all_terminal &= status.is_terminal();
        }

        if all_pending {
            IngestionStatus::YetToStart
        } else if all_completed {
            IngestionStatus::Completed
        } else if all_terminal {
            IngestionStatus::Failed
        } else {
            IngestionStatus::Triggered
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded, ordered chunk of item ids processed as one dispatch unit.
#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_id: String,
    /// Shared with the scheduler entry while the batch is pending.
    pub ids: Arc<[ItemId]>,
    pub status: BatchStatus,
    /// Creation order, used to break ties within a priority tier.
    pub sequence_number: u64,
}

impl Batch {
    pub fn new(batch_id: impl Into<String>, ids: Vec<ItemId>, sequence_number: u64) -> Self {
        Self {
            batch_id: batch_id.into(),
            ids: ids.into(),
            status: BatchStatus::YetToStart,
            sequence_number,
        }
    }
}

/// One accepted ingestion request and the batches it was split into.
#[derive(Debug, Clone)]
pub struct IngestionRecord {
    pub ingestion_id: String,
    pub priority: Priority,
    pub batches: Vec<Batch>,
    pub created_at: DateTime<Utc>,
}

impl IngestionRecord {
    pub fn status(&self) -> IngestionStatus {
        IngestionStatus::from_batches(self.batches.iter().map(|b| b.status))
    }

    /// Build the caller-facing view of this record.
    pub fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            ingestion_id: self.ingestion_id.clone(),
            status: self.status(),
            priority: self.priority,
            created_at: self.created_at,
            batches: self
                .batches
                .iter()
                .map(|b| BatchSnapshot {
                    batch_id: b.batch_id.clone(),
                    ids: b.ids.to_vec(),
                    status: b.status,
                })
                .collect(),
        }
    }
}

/// Point-in-time view of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub batch_id: String,
    pub ids: Vec<ItemId>,
    pub status: BatchStatus,
}

/// Point-in-time view of an ingestion, as returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionSnapshot {
    pub ingestion_id: String,
    pub status: IngestionStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub batches: Vec<BatchSnapshot>,
}

/// A batch waiting in the scheduler.
///
/// Holds only what dispatch needs; the owning record stays in the store.
#[derive(Debug, Clone)]
pub struct PendingBatch {
    pub batch_id: String,
    pub ingestion_id: String,
    pub priority: Priority,
    pub sequence_number: u64,
    pub ids: Arc<[ItemId]>,
    pub enqueued_at: tokio::time::Instant,
}

impl PendingBatch {
    pub fn from_batch(batch: &Batch, ingestion_id: &str, priority: Priority) -> Self {
        Self {
            batch_id: batch.batch_id.clone(),
            ingestion_id: ingestion_id.to_string(),
            priority,
            sequence_number: batch.sequence_number,
            ids: Arc::clone(&batch.ids),
            enqueued_at: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        let mut tiers = vec![Priority::Low, Priority::High, Priority::Medium];
        tiers.sort_by(|a, b| b.cmp(a));
        assert_eq!(tiers, Priority::ALL.to_vec());
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"HIGH\"");
        let parsed: Priority = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(parsed, Priority::Medium);
        assert!(serde_json::from_str::<Priority>("\"URGENT\"").is_err());
    }

    #[test]
    fn test_batch_status_transitions() {
        use BatchStatus::*;
        assert!(YetToStart.can_transition_to(Triggered));
        assert!(Triggered.can_transition_to(Completed));
        assert!(Triggered.can_transition_to(Failed));

        assert!(!YetToStart.can_transition_to(Completed));
        assert!(!Triggered.can_transition_to(YetToStart));
        assert!(!Completed.can_transition_to(Triggered));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn test_batch_status_serialization() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::YetToStart).unwrap(),
            "\"yet_to_start\""
        );
        assert_eq!(BatchStatus::Triggered.to_string(), "triggered");
    }

    #[test]
    fn test_aggregate_status() {
        use BatchStatus::*;
        assert_eq!(
            IngestionStatus::from_batches([YetToStart, YetToStart]),
            IngestionStatus::YetToStart
        );
        assert_eq!(
            IngestionStatus::from_batches([Triggered, YetToStart]),
            IngestionStatus::Triggered
        );
        assert_eq!(
            IngestionStatus::from_batches([Completed, YetToStart]),
            IngestionStatus::Triggered
        );
        assert_eq!(
            IngestionStatus::from_batches([Completed, Completed]),
            IngestionStatus::Completed
        );
        assert_eq!(
            IngestionStatus::from_batches([Completed, Failed]),
            IngestionStatus::Failed
        );
        assert_eq!(
            IngestionStatus::from_batches([Failed, Triggered]),
            IngestionStatus::Triggered
        );
    }

    #[test]
    fn test_snapshot_copies_batches_in_order() {
        let record = IngestionRecord {
            ingestion_id: "ing-1".to_string(),
            priority: Priority::Low,
            batches: vec![
                Batch::new("b-1", vec![1, 2], 0),
                Batch::new("b-2", vec![3], 1),
            ],
            created_at: Utc::now(),
        };

        let snapshot = record.snapshot();
        assert_eq!(snapshot.status, IngestionStatus::YetToStart);
        assert_eq!(snapshot.batches.len(), 2);
        assert_eq!(snapshot.batches[0].ids, vec![1, 2]);
        assert_eq!(snapshot.batches[1].batch_id, "b-2");

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "yet_to_start");
        assert_eq!(json["priority"], "LOW");
        assert_eq!(json["batches"][0]["status"], "yet_to_start");
    }
}
