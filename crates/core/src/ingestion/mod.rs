//! Accepting ingestion requests and answering status queries.

mod config;
mod service;

pub use config::IngestionConfig;
pub use service::{IngestError, IngestionService};
