use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Batch sizes are positive and the default fits under the maximum
/// - Rate limit window is positive
/// - Burst is exactly 1 (at most one dispatch per window)
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Ingestion validation
    let ingestion = &config.ingestion;
    if ingestion.default_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "ingestion.default_batch_size must be positive".to_string(),
        ));
    }
    if ingestion.max_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "ingestion.max_batch_size must be positive".to_string(),
        ));
    }
    if ingestion.default_batch_size > ingestion.max_batch_size {
        return Err(ConfigError::ValidationError(format!(
            "ingestion.default_batch_size ({}) exceeds ingestion.max_batch_size ({})",
            ingestion.default_batch_size, ingestion.max_batch_size
        )));
    }

    // Dispatcher validation
    if config.dispatcher.rate_limit_window_ms == 0 {
        return Err(ConfigError::ValidationError(
            "dispatcher.rate_limit_window_ms cannot be 0".to_string(),
        ));
    }
    if config.dispatcher.burst != 1 {
        return Err(ConfigError::ValidationError(format!(
            "dispatcher.burst must be 1, got {}",
            config.dispatcher.burst
        )));
    }

    Ok(())
}
