//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the [`BatchWorker`](crate::worker::BatchWorker)
//! trait so dispatch order, timing, and failures can be tested without a real
//! external service.
//!
//! # Example
//!
//! ```rust,ignore
//! use ingestor_core::testing::MockWorker;
//!
//! let worker = Arc::new(MockWorker::new());
//! worker.set_duration(Duration::from_millis(10)).await;
//!
//! // Pass to Dispatcher::new(...) as the worker
//! ```

mod mock_worker;

pub use mock_worker::{MockWorker, RecordedWork};
