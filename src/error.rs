//! Error types for the story generation pipeline.

use thiserror::Error;

/// Errors surfaced by planning, writing, compiling and their plumbing.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Plan generation failed: {reason}\nResponse: {raw_response}")]
    PlanGeneration {
        reason: String,
        raw_response: String,
    },

    #[error("Generation failed for section '{section}': {message}")]
    GenerationFailed { section: String, message: String },

    #[error("Planned section has no completed counterpart: {0}")]
    MissingSection(String),

    #[error("Section already written: {0}")]
    SectionAlreadyWritten(String),

    #[error("Duplicate task key dispatched in one wave: {0}")]
    DuplicateTask(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Collaborator '{collaborator}' unavailable: {message}")]
    CollaboratorUnavailable {
        collaborator: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Wrap a model-call failure as a writer failure for `section`.
    pub fn generation(section: &str, err: ApiError) -> Self {
        match err {
            ApiError::GenerationFailed { .. } => err,
            other => ApiError::GenerationFailed {
                section: section.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
