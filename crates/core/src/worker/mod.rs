//! The opaque unit of work a dispatched batch performs.

mod error;
mod simulated;
mod traits;

pub use error::WorkError;
pub use simulated::SimulatedWorker;
pub use traits::BatchWorker;
