use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Inference section exists (enforced by serde)
/// - Server port is not 0
/// - Body limit is not 0
/// - Inference URL is not empty
/// - Video bucket name is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.body_limit_mb == 0 {
        return Err(ConfigError::ValidationError(
            "server.body_limit_mb cannot be 0".to_string(),
        ));
    }

    if config.inference.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "inference.url cannot be empty".to_string(),
        ));
    }

    if config.blob_store.video_bucket.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "blob_store.video_bucket cannot be empty".to_string(),
        ));
    }

    Ok(())
}
