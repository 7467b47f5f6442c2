//! Model Provider Abstraction
//!
//! Unified interface to the text-generation model (OpenAI, Anthropic, local models via
//! Ollama, custom OpenAI-compatible servers). A single client is built per run and handed
//! to the planner and every section writer; nothing here is process-global.

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>, // For custom endpoints (e.g., Azure OpenAI)
    },
    Anthropic {
        model: String,
        api_key: String,
    },
    Ollama {
        model: String,
        base_url: Option<String>, // Default: http://localhost:11434
    },
    LocalCustom {
        model: String,
        endpoint: String, // Full endpoint URL (e.g., http://localhost:8080/v1)
        api_key: Option<String>,
    },
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Completion options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,  // 0.0-2.0, default: 1.0
    pub max_tokens: Option<u32>,   // Maximum tokens to generate
    pub top_p: Option<f32>,        // Nucleus sampling
    pub stop: Option<Vec<String>>, // Stop sequences
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            max_tokens: None,
            top_p: None,
            stop: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// List available models from the provider
    async fn list_models(&self) -> Result<Vec<String>, ApiError>;
}

/// Shared handle to the run's model client.
pub type SharedModelClient = Arc<dyn ModelProviderClient>;

/// Enrich a model-not-found error with the provider's model list, when it can be fetched.
pub async fn enhance_model_error(
    error: ApiError,
    client: &dyn ModelProviderClient,
) -> ApiError {
    if let ApiError::ProviderModelNotFound(_) = error {
        match client.list_models().await {
            Ok(available) if !available.is_empty() => ApiError::ProviderModelNotFound(format!(
                "Model '{}' not found. Available models: {}",
                client.model_name(),
                available.join(", ")
            )),
            Ok(_) => ApiError::ProviderModelNotFound(format!(
                "Model '{}' not found. Unable to retrieve available models list.",
                client.model_name()
            )),
            Err(_) => error,
        }
    } else {
        error
    }
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn to_openai_messages(messages: Vec<ChatMessage>) -> Vec<OpenAIMessage> {
    messages
        .into_iter()
        .map(|msg| OpenAIMessage {
            role: role_to_string(msg.role).to_string(),
            content: msg.content,
        })
        .collect()
}

fn map_http_error(error: reqwest::Error) -> ApiError {
    if let Some(status) = error.status() {
        match status.as_u16() {
            401 => ApiError::ProviderAuthFailed(format!("Authentication failed: {}", error)),
            429 => ApiError::ProviderRateLimit(format!("Rate limit exceeded: {}", error)),
            404 => ApiError::ProviderModelNotFound(format!("Model not found: {}", error)),
            _ => ApiError::ProviderRequestFailed(format!(
                "Request failed with status {}: {}",
                status, error
            )),
        }
    } else if error.is_timeout() {
        ApiError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::ProviderError(format!("HTTP error: {}", error))
    }
}

fn map_status_error(status: reqwest::StatusCode, error_text: String) -> ApiError {
    match status.as_u16() {
        401 => ApiError::ProviderAuthFailed(format!("Authentication failed: {}", error_text)),
        429 => ApiError::ProviderRateLimit(format!("Rate limit exceeded: {}", error_text)),
        404 => ApiError::ProviderModelNotFound(format!("Model not found: {}", error_text)),
        _ => ApiError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, error_text
        )),
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(map_status_error(status, error_text))
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
// Long-form chapters routinely take minutes.
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

fn build_provider_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Shared implementation for OpenAI-style `/chat/completions` endpoints.
async fn openai_compatible_complete(
    client: &Client,
    base_url: &str,
    model: &str,
    api_key: Option<&str>,
    messages: Vec<ChatMessage>,
    options: CompletionOptions,
) -> Result<CompletionResponse, ApiError> {
    let request = ChatCompletionRequest {
        model: model.to_string(),
        messages: to_openai_messages(messages),
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        top_p: options.top_p,
        stop: options.stop,
        stream: false,
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let mut builder = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&request);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }

    let response = ensure_success(builder.send().await.map_err(map_http_error)?).await?;

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::ProviderError("No choices in response".to_string()))?;

    let usage = completion.usage.unwrap_or(Usage {
        prompt_tokens: 0,
        completion_tokens: 0,
        total_tokens: 0,
    });

    Ok(CompletionResponse {
        content: choice.message.content,
        model: completion.model,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
        finish_reason: choice.finish_reason,
    })
}

async fn openai_compatible_models(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
) -> Result<Vec<String>, ApiError> {
    #[derive(Deserialize)]
    struct ModelsResponse {
        data: Vec<ModelInfo>,
    }
    #[derive(Deserialize)]
    struct ModelInfo {
        id: String,
    }

    let url = format!("{}/models", base_url.trim_end_matches('/'));
    let mut builder = client.get(&url);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    let response = ensure_success(builder.send().await.map_err(map_http_error)?).await?;

    let models: ModelsResponse = response.json().await.map_err(|e| {
        ApiError::ProviderError(format!("Failed to parse models response: {}", e))
    })?;

    Ok(models.data.into_iter().map(|m| m.id).collect())
}

/// OpenAI provider client
pub struct OpenAIClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self, ApiError> {
        let client = build_provider_http_client()?;
        let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client,
            model,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl ModelProviderClient for OpenAIClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        openai_compatible_complete(
            &self.client,
            &self.base_url,
            &self.model,
            Some(&self.api_key),
            messages,
            options,
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        openai_compatible_models(&self.client, &self.base_url, Some(&self.api_key)).await
    }
}

/// Anthropic messages API client
pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    const MESSAGES_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const DEFAULT_MAX_TOKENS: u32 = 4096;

    pub fn new(model: String, api_key: String) -> Result<Self, ApiError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl ModelProviderClient for AnthropicClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        // System prompts travel outside the message list for this API.
        let system_message: Vec<String> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .collect();

        let conversation: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| json!({"role": role_to_string(m.role), "content": m.content}))
            .collect();

        let mut request_body = json!({
            "model": self.model,
            "max_tokens": options.max_tokens.unwrap_or(Self::DEFAULT_MAX_TOKENS),
            "messages": conversation,
        });

        if !system_message.is_empty() {
            request_body["system"] = json!(system_message.join("\n\n"));
        }
        if let Some(temp) = options.temperature {
            request_body["temperature"] = json!(temp);
        }
        if let Some(top_p) = options.top_p {
            request_body["top_p"] = json!(top_p);
        }
        if let Some(stop) = options.stop {
            request_body["stop_sequences"] = json!(stop);
        }

        let response = self
            .client
            .post(Self::MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Vec<AnthropicContent>,
            model: String,
            usage: Option<AnthropicUsage>,
            stop_reason: Option<String>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: String,
        }

        #[derive(Deserialize)]
        struct AnthropicUsage {
            input_tokens: u32,
            output_tokens: u32,
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        let usage = completion.usage.unwrap_or(AnthropicUsage {
            input_tokens: 0,
            output_tokens: 0,
        });

        Ok(CompletionResponse {
            content,
            model: completion.model,
            usage: TokenUsage {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage.input_tokens + usage.output_tokens,
            },
            finish_reason: completion.stop_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        Err(ApiError::ProviderError(
            "Anthropic API does not provide a models list endpoint".to_string(),
        ))
    }
}

/// Ollama provider client (local models)
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaClient {
    pub fn new(model: String, base_url: Option<String>) -> Result<Self, ApiError> {
        let client = build_provider_http_client()?;
        let base_url = base_url.unwrap_or_else(|| "http://localhost:11434".to_string());
        Ok(Self {
            client,
            model,
            base_url,
        })
    }
}

#[async_trait]
impl ModelProviderClient for OllamaClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let mut ollama_options = serde_json::Map::new();
        if let Some(temp) = options.temperature {
            ollama_options.insert("temperature".to_string(), json!(temp));
        }
        if let Some(top_p) = options.top_p {
            ollama_options.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(max_tokens) = options.max_tokens {
            ollama_options.insert("num_predict".to_string(), json!(max_tokens));
        }
        if let Some(stop) = options.stop {
            ollama_options.insert("stop".to_string(), json!(stop));
        }

        let request_body = json!({
            "model": self.model,
            "messages": to_openai_messages(messages),
            "stream": false,
            "options": ollama_options,
        });

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        #[derive(Deserialize)]
        struct OllamaResponse {
            model: String,
            message: OpenAIMessage,
            #[serde(default)]
            done_reason: Option<String>,
            #[serde(default)]
            prompt_eval_count: Option<u32>,
            #[serde(default)]
            eval_count: Option<u32>,
        }

        let completion: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let prompt_tokens = completion.prompt_eval_count.unwrap_or(0);
        let completion_tokens = completion.eval_count.unwrap_or(0);

        Ok(CompletionResponse {
            content: completion.message.content,
            model: completion.model,
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            finish_reason: completion.done_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<TagInfo>,
        }
        #[derive(Deserialize)]
        struct TagInfo {
            name: String,
        }

        let url = format!("{}/api/tags", self.base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await.map_err(map_http_error)?;
        let response = ensure_success(response).await?;
        let tags: TagsResponse = response.json().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to parse models response: {}", e))
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// Custom local server speaking the OpenAI-compatible protocol
pub struct CustomLocalClient {
    client: Client,
    model: String,
    endpoint: String,
    api_key: Option<String>,
}

impl CustomLocalClient {
    pub fn new(model: String, endpoint: String, api_key: Option<String>) -> Result<Self, ApiError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            model,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl ModelProviderClient for CustomLocalClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        openai_compatible_complete(
            &self.client,
            &self.endpoint,
            &self.model,
            self.api_key.as_deref(),
            messages,
            options,
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        openai_compatible_models(&self.client, &self.endpoint, self.api_key.as_deref()).await
    }
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(provider: &ModelProvider) -> Result<SharedModelClient, ApiError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Arc::new(OpenAIClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Anthropic { model, api_key } => Ok(Arc::new(AnthropicClient::new(
                model.clone(),
                api_key.clone(),
            )?)),
            ModelProvider::Ollama { model, base_url } => Ok(Arc::new(OllamaClient::new(
                model.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Arc::new(CustomLocalClient::new(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
            )?)),
        }
    }
}
