//! Status tracking for ingestion records and their batches.

mod memory;
mod traits;

pub use memory::MemoryStatusStore;
pub use traits::{StatusStore, StoreError};
