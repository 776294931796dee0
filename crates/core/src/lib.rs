pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod ingestion;
pub mod metrics;
pub mod scheduler;
pub mod store;
pub mod testing;
pub mod worker;

pub use batch::{
    BatchSnapshot, BatchStatus, IngestionSnapshot, IngestionStatus, ItemId, Priority,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    ServerConfig,
};
pub use dispatcher::{
    BatchUpdateCallback, DispatchError, Dispatcher, DispatcherConfig, DispatcherStatus,
};
pub use ingestion::{IngestError, IngestionConfig, IngestionService};
pub use scheduler::{PriorityScheduler, RateLimiter};
pub use store::{MemoryStatusStore, StatusStore, StoreError};
pub use worker::{BatchWorker, SimulatedWorker, WorkError};
