//! Optional retrieval-context service client.
//!
//! Best effort: every failure (network, timeout, status, malformed body, no contexts)
//! is logged and surfaces as `None`.

use crate::config::RetrievalConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    #[serde(rename = "topK")]
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    contexts: Vec<RetrievedContext>,
}

/// One snippet returned by the service. All fields are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievedContext {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

pub struct RetrievalClient {
    client: Option<Client>,
    endpoint: String,
    top_k: usize,
}

impl RetrievalClient {
    pub fn new(base_url: &str, top_k: usize, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| warn!(error = %e, "Retrieval client could not be built"))
            .ok();
        Self {
            client,
            endpoint: format!("{}/retrieve", base_url.trim_end_matches('/')),
            top_k,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(
            &config.base_url,
            config.top_k,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Retrieve and format snippets for `query`.
    pub async fn retrieve(&self, query: &str) -> Option<String> {
        let client = self.client.as_ref()?;
        debug!(endpoint = %self.endpoint, top_k = self.top_k, "Querying retrieval service");

        let response = client
            .post(&self.endpoint)
            .json(&RetrieveRequest {
                query,
                top_k: self.top_k,
            })
            .send()
            .await
            .map_err(|e| warn!(error = %e, "Retrieval request failed"))
            .ok()?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "Retrieval service returned an error status");
            return None;
        }
        let body: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| warn!(error = %e, "Retrieval response was malformed"))
            .ok()?;

        let formatted = format_snippets(&body.contexts);
        if formatted.is_some() {
            info!(snippets = body.contexts.len(), "Retrieval context loaded");
        }
        formatted
    }
}

/// Render snippets as a `RAG Context` block; `None` when there are none.
pub fn format_snippets(contexts: &[RetrievedContext]) -> Option<String> {
    if contexts.is_empty() {
        return None;
    }
    let parts: Vec<String> = contexts
        .iter()
        .enumerate()
        .map(|(index, context)| {
            let title = context
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or("Untitled");
            format!(
                "Snippet {} ({})\nSource: {}\n{}",
                index + 1,
                title,
                context.source.as_deref().unwrap_or_default(),
                context.content.as_deref().unwrap_or_default(),
            )
        })
        .collect();
    Some(format!("RAG Context:\n---\n{}\n---", parts.join("\n\n---\n")))
}
