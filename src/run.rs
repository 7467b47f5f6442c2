//! Single story entry point: resolve collaborators, run the orchestrator, write the document.
//! The CLI and other callers use this only; no orchestration lives in adapters.

use crate::config::StoryConfig;
use crate::error::ApiError;
use crate::provider::{ProviderFactory, SharedModelClient};
use crate::sources::{
    combine_reference_context, read_notes, resolve_notes_path, ReferenceFetcher, RetrievalClient,
};
use crate::story::{RunPhase, StoryOrchestrator, StoryPlan, StoryRequest};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Upper bound on how much of the notes is sent as the retrieval query.
const RETRIEVAL_QUERY_CHARS: usize = 2000;

/// Inputs for `generate`, already parsed by the caller.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub notes: PathBuf,
    pub urls: Vec<String>,
    pub output: Option<PathBuf>,
    /// Replaces the configured structure template for this run.
    pub structure_template: Option<String>,
    /// Replaces the configured per-wave concurrency limit for this run.
    pub max_parallel: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output_path: PathBuf,
    pub plan: StoryPlan,
    pub transitions: Vec<RunPhase>,
    pub document_chars: usize,
}

/// Generate a story and write it to disk.
pub async fn run_story(
    config: &StoryConfig,
    client: SharedModelClient,
    workspace_root: &Path,
    request: &GenerateRequest,
) -> Result<GenerateReport, ApiError> {
    let story_request = build_story_request(config, workspace_root, request).await?;
    let max_parallel = request.max_parallel.or(config.story.max_parallel);
    let orchestrator =
        StoryOrchestrator::new(client, config.provider.completion_options(), max_parallel);
    let outcome = orchestrator.run(&story_request).await?;

    let output_path = match &request.output {
        Some(path) => path.clone(),
        None => default_output_path(&workspace_root.join(&config.story.output_dir)),
    };
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&output_path, &outcome.document)?;
    info!(path = %output_path.display(), "Story written");

    Ok(GenerateReport {
        output_path,
        plan: outcome.plan,
        transitions: outcome.transitions,
        document_chars: outcome.document.len(),
    })
}

/// Run only the planning stage for a notes file.
pub async fn preview_plan(
    config: &StoryConfig,
    client: SharedModelClient,
    workspace_root: &Path,
    notes: &Path,
) -> Result<StoryPlan, ApiError> {
    let notes_dir = workspace_root.join(&config.story.notes_dir);
    let request = StoryRequest {
        notes: read_notes(&resolve_notes_path(notes, &notes_dir)),
        reference_context: String::new(),
        structure_template: config.story.structure_template.clone(),
    };
    let orchestrator = StoryOrchestrator::new(client, config.provider.completion_options(), None);
    orchestrator.plan_only(&request).await
}

/// Build the configured model client once for a run.
pub fn build_client(config: &StoryConfig) -> Result<SharedModelClient, ApiError> {
    config.ensure_valid()?;
    let provider = config.provider.to_model_provider()?;
    ProviderFactory::create_client(&provider)
}

/// Synchronous wrapper for `run_story` with the configured provider.
pub fn run_generate(
    config: &StoryConfig,
    workspace_root: &Path,
    request: &GenerateRequest,
) -> Result<GenerateReport, ApiError> {
    let client = build_client(config)?;
    block_on(run_story(config, client, workspace_root, request))?
}

/// Synchronous wrapper for `preview_plan` with the configured provider.
pub fn run_plan_preview(
    config: &StoryConfig,
    workspace_root: &Path,
    notes: &Path,
) -> Result<StoryPlan, ApiError> {
    let client = build_client(config)?;
    block_on(preview_plan(config, client, workspace_root, notes))?
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, ApiError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ApiError::ProviderError(
            "Cannot start a story run from within an async runtime; call run_story instead"
                .to_string(),
        ));
    }
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

/// Fetch reference URLs. A fetcher that cannot be built degrades to no URL material.
async fn load_url_material(urls: &[String]) -> String {
    if urls.iter().all(|u| u.trim().is_empty()) {
        return String::new();
    }
    match ReferenceFetcher::new() {
        Ok(fetcher) => fetcher.fetch_all(urls).await,
        Err(err) => {
            warn!(error = %err, "Reference fetcher unavailable, continuing without URL material");
            String::new()
        }
    }
}

async fn build_story_request(
    config: &StoryConfig,
    workspace_root: &Path,
    request: &GenerateRequest,
) -> Result<StoryRequest, ApiError> {
    let notes_dir = workspace_root.join(&config.story.notes_dir);
    let notes = read_notes(&resolve_notes_path(&request.notes, &notes_dir));

    let url_material = load_url_material(&request.urls).await;

    let retrieved = if config.retrieval.enabled {
        let query = retrieval_query(&notes);
        if query.is_empty() {
            warn!("Notes are empty, skipping retrieval");
            None
        } else {
            RetrievalClient::from_config(&config.retrieval)
                .retrieve(&query)
                .await
        }
    } else {
        None
    };

    Ok(StoryRequest {
        notes,
        reference_context: combine_reference_context(&url_material, retrieved.as_deref()),
        structure_template: request
            .structure_template
            .clone()
            .unwrap_or_else(|| config.story.structure_template.clone()),
    })
}

fn retrieval_query(notes: &str) -> String {
    notes.trim().chars().take(RETRIEVAL_QUERY_CHARS).collect()
}

/// `<dir>/campaign_<YYYYMMDD_HHMMSS>.md`
pub fn default_output_path(output_dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    output_dir.join(format!("campaign_{}.md", stamp))
}
