//! Ingestion configuration.

use serde::{Deserialize, Serialize};

/// Configuration for accepting submissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionConfig {
    /// Batch size used when a request does not specify one.
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Largest batch size a request may ask for.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_batch_size() -> usize {
    3
}

fn default_max_batch_size() -> usize {
    1000
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            max_batch_size: default_max_batch_size(),
        }
    }
}
