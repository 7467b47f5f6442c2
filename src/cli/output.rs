//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::PlanGeneration { reason, .. } => format!(
            "Plan generation failed: {}\nRe-run with --verbose to log the raw model response.",
            reason
        ),
        ApiError::ProviderNotConfigured(msg) => format!(
            "Provider not configured: {}\nSet [provider] in config/config.toml or use --set provider.api_key=...",
            msg
        ),
        other => other.to_string(),
    }
}
