//! Dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Length of the rate-limit window (milliseconds).
    /// At most one batch starts per window.
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_ms: u64,

    /// Unused permits the limiter may bank. Config validation only accepts
    /// 1; larger values are for building a `RateLimiter` directly.
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Duration of the simulated external call (milliseconds).
    #[serde(default = "default_process_delay")]
    pub process_delay_ms: u64,

    /// How long stop() waits for in-flight batches before abandoning them
    /// (milliseconds). Abandoned batches settle as failed.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

fn default_rate_limit_window() -> u64 {
    5000 // 5 seconds
}

fn default_burst() -> u32 {
    1
}

fn default_process_delay() -> u64 {
    2000 // 2 seconds
}

fn default_shutdown_grace() -> u64 {
    10_000 // 10 seconds
}

impl DispatcherConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn process_delay(&self) -> Duration {
        Duration::from_millis(self.process_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_ms: default_rate_limit_window(),
            burst: default_burst(),
            process_delay_ms: default_process_delay(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}
