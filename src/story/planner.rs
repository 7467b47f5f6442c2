//! Plan generator: one model call turning notes and a structure template into a plan.

use crate::error::ApiError;
use crate::provider::{enhance_model_error, CompletionOptions, SharedModelClient};
use crate::story::plan::{parse_plan_response, StoryPlan};
use crate::story::prompts::planner_messages;
use crate::story::section::Wave;
use tracing::{debug, info, instrument, warn};

pub struct PlanGenerator {
    client: SharedModelClient,
    options: CompletionOptions,
}

impl PlanGenerator {
    pub fn new(client: SharedModelClient, options: CompletionOptions) -> Self {
        Self { client, options }
    }

    /// Ask the model for an outline and validate it. Not retried on failure.
    #[instrument(skip_all, fields(provider = self.client.provider_name(), model = self.client.model_name()))]
    pub async fn generate(&self, notes: &str, structure_template: &str) -> Result<StoryPlan, ApiError> {
        if notes.trim().is_empty() {
            warn!("Generating plan from empty notes");
        }

        // Provider failures pass through as provider errors; only unusable output is PlanGeneration.
        let response = match self
            .client
            .complete(
                planner_messages(notes, structure_template),
                self.options.clone(),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => return Err(enhance_model_error(err, self.client.as_ref()).await),
        };
        debug!(chars = response.content.len(), "Plan response received");

        let plan = parse_plan_response(&response.content).inspect_err(|_| {
            debug!(response = %response.content, "Unparseable plan response");
        })?;
        info!(
            sections = plan.len(),
            body = plan.wave_len(Wave::Body),
            framing = plan.wave_len(Wave::Framing),
            "Story plan created"
        );
        Ok(plan)
    }
}
