use super::shared::{format_heading, truncate};
use crate::error::ApiError;
use crate::story::{StoryPlan, Wave};
use comfy_table::Table;

const DESCRIPTION_WIDTH: usize = 72;

pub fn format_plan_text(plan: &StoryPlan) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Section", "Wave", "Description"]);
    for (index, section) in plan.sections().iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            section.name.clone(),
            section.wave().to_string(),
            truncate(&section.description, DESCRIPTION_WIDTH),
        ]);
    }
    format!(
        "{}\n{}\n{} body, {} framing",
        format_heading("Story Plan"),
        table,
        plan.wave_len(Wave::Body),
        plan.wave_len(Wave::Framing)
    )
}

pub fn format_plan_json(plan: &StoryPlan) -> Result<String, ApiError> {
    serde_json::to_string_pretty(plan)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize plan: {}", e)))
}
