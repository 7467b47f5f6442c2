//! Story generation core: plan, two writing waves, aggregation and compilation.
//!
//! Control flow is
//! `PlanGenerator -> body wave (parallel) -> aggregate -> framing wave (parallel) -> compile`.
//! Writers receive owned copies of their section and hand back the filled copy; only the
//! orchestrator holds the plan and the completed set.

pub mod aggregate;
pub mod compile;
pub mod gather;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod prompts;
pub mod section;
pub mod writer;

pub use aggregate::aggregate_body;
pub use compile::compile_document;
pub use gather::scatter_gather;
pub use orchestrator::{RunPhase, StoryOrchestrator, StoryOutcome, StoryRequest};
pub use plan::{extract_json_payload, parse_plan_response, StoryPlan};
pub use planner::PlanGenerator;
pub use section::{Section, Wave};
pub use writer::SectionWriter;
