//! Configuration System
//!
//! Layered configuration for a story run: built-in defaults, a user-level file, workspace
//! files, environment variables and finally per-run overrides. Validation reports every
//! problem at once.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::{CompletionOptions, ModelProvider};
use crate::story::prompts::DEFAULT_STRUCTURE_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::{parse_override, ConfigLoader, RunOverrides};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Generation model settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Story layout and run settings
    #[serde(default)]
    pub story: StorySettings,

    /// Optional retrieval-context service
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which wire protocol the generation model speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Ollama,
    Local,
}

impl ProviderType {
    pub fn slug(self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Ollama => "ollama",
            ProviderType::Local => "local",
        }
    }

    fn requires_api_key(self) -> bool {
        matches!(self, ProviderType::OpenAI | ProviderType::Anthropic)
    }
}

/// Generation model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    /// Endpoint override (required for `local`)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_provider_type() -> ProviderType {
    ProviderType::OpenAI
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            endpoint: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl ProviderConfig {
    /// Validate provider settings without touching the environment
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            reqwest::Url::parse(endpoint)
                .map_err(|e| format!("Invalid endpoint '{}': {}", endpoint, e))?;
        }
        if self.provider_type == ProviderType::Local && self.endpoint.is_none() {
            return Err("Provider type 'local' requires an endpoint".to_string());
        }
        if self.provider_type.requires_api_key()
            && self.api_key.is_none()
            && self.api_key_env.is_none()
        {
            return Err(format!(
                "Provider type '{}' requires api_key or api_key_env",
                self.provider_type.slug()
            ));
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("Temperature {} outside 0.0-2.0", temperature));
            }
        }
        Ok(())
    }

    /// Resolve the API key: inline value first, then the named environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty())
        })
    }

    /// Build the runtime provider description
    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        let require_key = || {
            self.resolve_api_key().ok_or_else(|| {
                ApiError::ProviderNotConfigured(format!(
                    "No API key for provider '{}'. Set {} or provider.api_key.",
                    self.provider_type.slug(),
                    self.api_key_env.as_deref().unwrap_or("provider.api_key_env")
                ))
            })
        };

        match self.provider_type {
            ProviderType::OpenAI => Ok(ModelProvider::OpenAI {
                model: self.model.clone(),
                api_key: require_key()?,
                base_url: self.endpoint.clone(),
            }),
            ProviderType::Anthropic => Ok(ModelProvider::Anthropic {
                model: self.model.clone(),
                api_key: require_key()?,
            }),
            ProviderType::Ollama => Ok(ModelProvider::Ollama {
                model: self.model.clone(),
                base_url: self.endpoint.clone(),
            }),
            ProviderType::Local => Ok(ModelProvider::LocalCustom {
                model: self.model.clone(),
                endpoint: self.endpoint.clone().ok_or_else(|| {
                    ApiError::ProviderNotConfigured(
                        "Provider type 'local' requires provider.endpoint".to_string(),
                    )
                })?,
                api_key: self.resolve_api_key(),
            }),
        }
    }

    pub fn completion_options(&self) -> CompletionOptions {
        let defaults = CompletionOptions::default();
        CompletionOptions {
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens,
            ..defaults
        }
    }
}

/// Story layout and run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySettings {
    /// Free-text description of the expected section layout
    #[serde(default = "default_structure_template")]
    pub structure_template: String,

    /// Directory searched for notes files given by relative name
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,

    /// Directory for timestamped output documents
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Upper bound on concurrently running writers per wave; unbounded when unset
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

fn default_structure_template() -> String {
    DEFAULT_STRUCTURE_TEMPLATE.to_string()
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from("notes")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            structure_template: default_structure_template(),
            notes_dir: default_notes_dir(),
            output_dir: default_output_dir(),
            max_parallel: None,
        }
    }
}

impl StorySettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.structure_template.trim().is_empty() {
            return Err("Structure template cannot be empty".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err("Output directory cannot be empty".to_string());
        }
        if self.max_parallel == Some(0) {
            return Err("max_parallel must be at least 1 when set".to_string());
        }
        Ok(())
    }
}

/// Optional retrieval-context service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_retrieval_base_url")]
    pub base_url: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_retrieval_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_retrieval_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_retrieval_timeout_secs() -> u64 {
    20
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_retrieval_base_url(),
            top_k: default_top_k(),
            timeout_secs: default_retrieval_timeout_secs(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be positive".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be positive".to_string());
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid base_url '{}': {}", self.base_url, e))?;
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Story(String),
    Retrieval(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Story(msg) => write!(f, "Story: {}", msg),
            ValidationError::Retrieval(msg) => write!(f, "Retrieval: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl StoryConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.story.validate() {
            errors.push(ValidationError::Story(e));
        }
        if self.retrieval.enabled {
            if let Err(e) = self.retrieval.validate() {
                errors.push(ValidationError::Retrieval(e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one `ConfigError`
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            ApiError::ConfigError(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })
    }

    /// Copy safe for display: inline secrets masked
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.provider.api_key.is_some() {
            copy.provider.api_key = Some("********".to_string());
        }
        copy
    }
}
