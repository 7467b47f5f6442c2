//! Story orchestrator: plan, body wave, aggregate, framing wave, compile.

use crate::error::ApiError;
use crate::provider::{CompletionOptions, SharedModelClient};
use crate::story::aggregate::aggregate_body;
use crate::story::compile::compile_document;
use crate::story::gather::scatter_gather;
use crate::story::plan::StoryPlan;
use crate::story::planner::PlanGenerator;
use crate::story::section::{Section, Wave};
use crate::story::writer::SectionWriter;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{error, info, instrument};

/// Phases a run moves through. `Failed` is terminal and reachable from any other phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Planning,
    WritingBody,
    AggregatingBody,
    WritingFraming,
    Compiling,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Planning => "planning",
            RunPhase::WritingBody => "writing_body",
            RunPhase::AggregatingBody => "aggregating_body",
            RunPhase::WritingFraming => "writing_framing",
            RunPhase::Compiling => "compiling",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Inputs for one run. All fields are shared read-only with every writer task.
#[derive(Debug, Clone, Default)]
pub struct StoryRequest {
    pub notes: String,
    pub reference_context: String,
    pub structure_template: String,
}

#[derive(Debug, Clone)]
pub struct StoryOutcome {
    pub document: String,
    pub plan: StoryPlan,
    pub completed: HashMap<String, Section>,
    pub transitions: Vec<RunPhase>,
}

pub struct StoryOrchestrator {
    planner: PlanGenerator,
    writer: SectionWriter,
    max_parallel: Option<usize>,
}

impl StoryOrchestrator {
    /// Build an orchestrator around one injected model client.
    ///
    /// `max_parallel` bounds each wave's fan-out; `None` dispatches the whole wave at once.
    pub fn new(
        client: SharedModelClient,
        options: CompletionOptions,
        max_parallel: Option<usize>,
    ) -> Self {
        Self {
            planner: PlanGenerator::new(client.clone(), options.clone()),
            writer: SectionWriter::new(client, options),
            max_parallel,
        }
    }

    /// Run only the planning stage.
    pub async fn plan_only(&self, request: &StoryRequest) -> Result<StoryPlan, ApiError> {
        self.planner
            .generate(&request.notes, &request.structure_template)
            .await
    }

    /// Run the full pipeline. Any failure fails the whole run; no partial document is returned.
    #[instrument(skip_all)]
    pub async fn run(&self, request: &StoryRequest) -> Result<StoryOutcome, ApiError> {
        let mut transitions = Vec::new();
        match self.drive(request, &mut transitions).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let phase = transitions.last().copied().unwrap_or(RunPhase::Planning);
                error!(phase = %phase, error = %err, "Story run failed");
                enter(&mut transitions, RunPhase::Failed);
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        request: &StoryRequest,
        transitions: &mut Vec<RunPhase>,
    ) -> Result<StoryOutcome, ApiError> {
        enter(transitions, RunPhase::Planning);
        let plan = self.plan_only(request).await?;

        enter(transitions, RunPhase::WritingBody);
        let body_tasks: Vec<_> = plan
            .wave(Wave::Body)
            .into_iter()
            .map(|section| {
                let key = section.name.clone();
                let task = self.writer.write_body_section(
                    section,
                    &request.notes,
                    &request.reference_context,
                );
                (key, task)
            })
            .collect();
        info!(wave = %Wave::Body, count = body_tasks.len(), "Dispatching wave");
        let mut completed = scatter_gather(body_tasks, self.max_parallel).await?;

        enter(transitions, RunPhase::AggregatingBody);
        let body_context = aggregate_body(&plan, &completed);

        enter(transitions, RunPhase::WritingFraming);
        let framing_tasks: Vec<_> = plan
            .wave(Wave::Framing)
            .into_iter()
            .map(|section| {
                let key = section.name.clone();
                let task = self.writer.write_framing_section(
                    section,
                    &body_context,
                    &request.reference_context,
                );
                (key, task)
            })
            .collect();
        info!(wave = %Wave::Framing, count = framing_tasks.len(), "Dispatching wave");
        completed.extend(scatter_gather(framing_tasks, self.max_parallel).await?);

        enter(transitions, RunPhase::Compiling);
        let document = compile_document(&plan, &completed)?;

        enter(transitions, RunPhase::Done);
        info!(sections = plan.len(), chars = document.len(), "Story compiled");
        Ok(StoryOutcome {
            document,
            plan,
            completed,
            transitions: transitions.clone(),
        })
    }
}

fn enter(transitions: &mut Vec<RunPhase>, phase: RunPhase) {
    info!(phase = %phase, "Entering phase");
    transitions.push(phase);
}
