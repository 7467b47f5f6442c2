//! Story plan: the ordered section list and the parser that builds it from model output.
//!
//! Model output is located (fenced block, bare object, or whole text), parsed as JSON and
//! then checked field by field so that one error reports every schema problem.

use crate::error::ApiError;
use crate::story::section::{Section, Wave};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// One schema problem found while validating a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanIssue {
    pub path: String,
    pub problem: String,
}

impl PlanIssue {
    fn new(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

fn join_issues(issues: &[PlanIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ordered, validated section list. Order is the final document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryPlan {
    sections: Vec<Section>,
}

impl StoryPlan {
    /// Build a plan, rejecting empty plans, blank names and duplicate names.
    /// Any pre-filled content is discarded; plans never carry written text.
    pub fn new(sections: Vec<Section>) -> Result<Self, Vec<PlanIssue>> {
        let mut issues = Vec::new();
        if sections.is_empty() {
            issues.push(PlanIssue::new("sections", "must contain at least one section"));
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (index, section) in sections.iter().enumerate() {
            let name = section.name.trim();
            if name.is_empty() {
                issues.push(PlanIssue::new(format!("sections[{index}].name"), "must not be empty"));
                continue;
            }
            if let Some(first) = seen.insert(name, index) {
                issues.push(PlanIssue::new(
                    format!("sections[{index}].name"),
                    format!("duplicate of sections[{first}] ('{name}')"),
                ));
            }
        }

        if !issues.is_empty() {
            return Err(issues);
        }

        let sections = sections
            .into_iter()
            .map(|mut section| {
                section.name = section.name.trim().to_string();
                if section.is_written() {
                    debug!(section = %section.name, "Discarding content supplied at plan time");
                    section.content.clear();
                }
                section
            })
            .collect();

        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Owned copies of one wave's sections, in plan order.
    pub fn wave(&self, wave: Wave) -> Vec<Section> {
        self.sections
            .iter()
            .filter(|s| s.wave() == wave)
            .cloned()
            .collect()
    }

    pub fn wave_len(&self, wave: Wave) -> usize {
        self.sections.iter().filter(|s| s.wave() == wave).count()
    }
}

fn fenced_json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*json[ \t]*\r?\n?(.*?)```").expect("static regex is valid")
    })
}

fn fenced_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```|```(.*?)```")
            .expect("static regex is valid")
    })
}

/// Locate the JSON payload inside a model response.
///
/// Preference: a ```json fenced block, any other fenced block, the span from the first
/// `{` to the last `}`, and finally the whole trimmed text.
pub fn extract_json_payload(response: &str) -> &str {
    if let Some(captures) = fenced_json_block().captures(response) {
        if let Some(body) = captures.get(1) {
            return body.as_str().trim();
        }
    }
    if let Some(captures) = fenced_block().captures(response) {
        if let Some(body) = captures.get(1).or_else(|| captures.get(2)) {
            return body.as_str().trim();
        }
    }
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return &response[start..=end];
        }
    }
    response.trim()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn required_string(
    entry: &serde_json::Map<String, Value>,
    index: usize,
    field: &str,
    issues: &mut Vec<PlanIssue>,
) -> Option<String> {
    let path = format!("sections[{index}].{field}");
    match entry.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            issues.push(PlanIssue::new(path, format!("expected string, got {}", type_name(other))));
            None
        }
        None => {
            issues.push(PlanIssue::new(path, "missing"));
            None
        }
    }
}

fn section_from_value(value: &Value, index: usize, issues: &mut Vec<PlanIssue>) -> Option<Section> {
    let Value::Object(entry) = value else {
        issues.push(PlanIssue::new(
            format!("sections[{index}]"),
            format!("expected object, got {}", type_name(value)),
        ));
        return None;
    };

    let name = required_string(entry, index, "name", issues);
    let description = required_string(entry, index, "description", issues);

    let content = match entry.get("content") {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            issues.push(PlanIssue::new(
                format!("sections[{index}].content"),
                format!("expected string, got {}", type_name(other)),
            ));
            None
        }
    };

    let main_body = match entry.get("main_body") {
        Some(Value::Bool(flag)) => Some(*flag),
        Some(other) => {
            issues.push(PlanIssue::new(
                format!("sections[{index}].main_body"),
                format!("expected boolean, got {}", type_name(other)),
            ));
            None
        }
        None => {
            issues.push(PlanIssue::new(format!("sections[{index}].main_body"), "missing"));
            None
        }
    };

    Some(Section {
        name: name?,
        description: description?,
        content: content?,
        main_body: main_body?,
    })
}

/// Validate a parsed JSON document against the plan schema, collecting every issue.
pub fn plan_from_value(value: &Value) -> Result<StoryPlan, Vec<PlanIssue>> {
    let Value::Object(root) = value else {
        return Err(vec![PlanIssue::new(
            "$",
            format!("expected object, got {}", type_name(value)),
        )]);
    };
    let entries = match root.get("sections") {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(vec![PlanIssue::new(
                "sections",
                format!("expected array, got {}", type_name(other)),
            )])
        }
        None => return Err(vec![PlanIssue::new("sections", "missing")]),
    };

    let mut issues = Vec::new();
    let sections: Vec<Section> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| section_from_value(entry, index, &mut issues))
        .collect();

    if !issues.is_empty() {
        return Err(issues);
    }
    StoryPlan::new(sections)
}

/// Turn a raw model response into a validated plan.
pub fn parse_plan_response(response: &str) -> Result<StoryPlan, ApiError> {
    let payload = extract_json_payload(response);
    let value: Value = serde_json::from_str(payload).map_err(|e| ApiError::PlanGeneration {
        reason: format!("response is not valid JSON: {}", e),
        raw_response: response.to_string(),
    })?;
    plan_from_value(&value).map_err(|issues| ApiError::PlanGeneration {
        reason: format!("plan failed schema validation: {}", join_issues(&issues)),
        raw_response: response.to_string(),
    })
}
