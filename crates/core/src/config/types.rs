use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::dispatcher::DispatcherConfig;
use crate::ingestion::IngestionConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Config as reported by the API, with durations spelled out for humans.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub ingestion: IngestionConfig,
    pub dispatcher: SanitizedDispatcherConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDispatcherConfig {
    pub rate_limit_window_ms: u64,
    pub burst: u32,
    pub process_delay_ms: u64,
    pub shutdown_grace_ms: u64,
    /// Upper bound on sustained dispatch throughput.
    pub max_dispatches_per_minute: f64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let d = &config.dispatcher;
        let max_dispatches_per_minute = if d.rate_limit_window_ms == 0 {
            0.0
        } else {
            60_000.0 / d.rate_limit_window_ms as f64
        };
        Self {
            server: config.server.clone(),
            ingestion: config.ingestion.clone(),
            dispatcher: SanitizedDispatcherConfig {
                rate_limit_window_ms: d.rate_limit_window_ms,
                burst: d.burst,
                process_delay_ms: d.process_delay_ms,
                shutdown_grace_ms: d.shutdown_grace_ms,
                max_dispatches_per_minute,
            },
        }
    }
}
