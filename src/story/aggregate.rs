//! Body aggregation: render the finished body wave as context for the framing wave.

use crate::story::plan::StoryPlan;
use crate::story::section::{Section, Wave};
use std::collections::HashMap;

pub const NOT_YET_WRITTEN: &str = "[Not yet written]";

const RULE_WIDTH: usize = 60;

/// Render completed body sections in plan order, independent of completion order.
///
/// A plan with no body sections yields an empty string.
pub fn aggregate_body(plan: &StoryPlan, completed: &HashMap<String, Section>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    plan.wave(Wave::Body)
        .iter()
        .enumerate()
        .map(|(index, planned)| {
            let content = completed
                .get(&planned.name)
                .map(|s| s.content.as_str())
                .filter(|c| !c.is_empty())
                .unwrap_or(NOT_YET_WRITTEN);
            format!(
                "{rule}\nSection {}: {}\n{rule}\nDescription: {}\nMain body: {}\n\nContent:\n{}\n",
                index + 1,
                planned.name,
                planned.description,
                planned.main_body,
                content,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
