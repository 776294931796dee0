//! Batch dispatcher: the control loop that drains the scheduler.
//!
//! Dispatch decisions are serialized on one loop; execution is parallel:
//! - **Admission**: one rate-limit permit per dispatch, then priority selection
//! - **Execution**: each batch's unit of work runs on its own task
//! - **Shutdown**: stop dispatching, give in-flight work a grace period, then
//!   abandon it as failed

mod config;
mod runner;
mod types;

pub use config::DispatcherConfig;
pub use runner::{BatchUpdateCallback, Dispatcher};
pub use types::{DispatchError, DispatcherStatus};
