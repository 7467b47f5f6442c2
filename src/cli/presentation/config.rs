use crate::config::StoryConfig;
use crate::error::ApiError;

/// Render the effective configuration with secrets redacted.
pub fn format_config(config: &StoryConfig, format: &str) -> Result<String, ApiError> {
    let redacted = config.redacted();
    match format {
        "json" => serde_json::to_string_pretty(&redacted)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e))),
        "toml" => toml::to_string_pretty(&redacted)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e))),
        other => Err(ApiError::ConfigError(format!(
            "Unknown format '{}'; expected toml or json",
            other
        ))),
    }
}
