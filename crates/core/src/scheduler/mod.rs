//! Dispatch ordering and throttling.
//!
//! - [`PriorityScheduler`] decides *which* pending batch runs next.
//! - [`RateLimiter`] decides *when* the next batch may start.

mod priority_queue;
mod rate_limiter;

pub use priority_queue::PriorityScheduler;
pub use rate_limiter::{RateLimitStatus, RateLimiter, TokenBucket};
