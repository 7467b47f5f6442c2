//! Final compilation: join written sections back onto the plan.

use crate::error::ApiError;
use crate::story::plan::StoryPlan;
use crate::story::section::Section;
use std::collections::HashMap;

/// Concatenate section content in plan order, separated by a blank line.
///
/// Every planned section must have a written counterpart in `completed`.
pub fn compile_document(
    plan: &StoryPlan,
    completed: &HashMap<String, Section>,
) -> Result<String, ApiError> {
    let mut parts = Vec::with_capacity(plan.len());
    for planned in plan.sections() {
        let section = completed
            .get(&planned.name)
            .ok_or_else(|| ApiError::MissingSection(planned.name.clone()))?;
        if !section.is_written() {
            return Err(ApiError::GenerationFailed {
                section: planned.name.clone(),
                message: "section has no content at compile time".to_string(),
            });
        }
        parts.push(section.content.as_str());
    }
    Ok(parts.join("\n\n"))
}
