//! Shared test utilities for integration tests
//!
//! Provides a scripted model client and environment isolation for config tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use taleweaver::config::StoryConfig;
use taleweaver::error::ApiError;
use taleweaver::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, TokenUsage,
};
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

/// Plan with a prologue, three body chapters and an epilogue.
pub const CAMPAIGN_PLAN: &str = r#"Here is the outline:
```json
{
  "sections": [
    {"name": "Prologue: The Gathering", "description": "An omen over Neverwinter", "content": "", "main_body": false},
    {"name": "Chapter 1: The Heroes", "description": "Wizard, rogue and fighter", "content": "", "main_body": true},
    {"name": "Chapter 2: The World Awakens", "description": "Neverwinter and its factions", "content": "", "main_body": true},
    {"name": "Chapter 3: Quests and Perils", "description": "The lich's phylactery", "content": "", "main_body": true},
    {"name": "Epilogue: Destiny Awaits", "description": "The final battle", "content": "", "main_body": false}
  ]
}
```"#;

/// One call seen by the fake model.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Section being written, `None` for the planner call.
    pub section: Option<String>,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Model client answering the planner with a fixed plan and each writer with
/// `Text of <section>.`, with optional per-section delays and failures.
pub struct FakeModel {
    plan: String,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    calls: Mutex<Vec<RecordedCall>>,
    events: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new(plan: &str) -> Self {
        Self {
            plan: plan.to_string(),
            delays: HashMap::new(),
            failures: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, section: &str, millis: u64) -> Self {
        self.delays
            .insert(section.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn failing_on(mut self, section: &str) -> Self {
        self.failures.insert(section.to_string());
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// `start:<section>` and `end:<section>` in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn written_sections(&self) -> Vec<String> {
        self.calls().into_iter().filter_map(|c| c.section).collect()
    }

    pub fn prompt_for(&self, section: &str) -> Option<String> {
        self.calls()
            .into_iter()
            .find(|c| c.section.as_deref() == Some(section))
            .map(|c| c.system_prompt)
    }
}

/// Writer prompts name their section on the line after "... to write:".
pub fn section_in_prompt(prompt: &str) -> Option<String> {
    let (_, rest) = prompt.split_once(" to write:\n")?;
    rest.lines().next().map(|line| line.trim().to_string())
}

pub fn written_text(section: &str) -> String {
    format!("Text of {}.", section)
}

#[async_trait]
impl ModelProviderClient for FakeModel {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let system_prompt = messages
            .first()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let user_prompt = messages
            .get(1)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let section = section_in_prompt(&system_prompt);
        self.calls.lock().push(RecordedCall {
            section: section.clone(),
            system_prompt,
            user_prompt,
        });

        let content = match section {
            None => self.plan.clone(),
            Some(name) => {
                self.events.lock().push(format!("start:{}", name));
                if let Some(delay) = self.delays.get(&name) {
                    tokio::time::sleep(*delay).await;
                }
                self.events.lock().push(format!("end:{}", name));
                if self.failures.contains(&name) {
                    return Err(ApiError::ProviderRequestFailed(format!(
                        "scripted failure for {}",
                        name
                    )));
                }
                written_text(&name)
            }
        };

        Ok(CompletionResponse {
            content,
            model: "fake-model".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec!["fake-model".to_string()])
    }
}

/// Default config rooted in a temp workspace, with a notes file written to `notes/`.
pub fn workspace_with_notes(notes: &str) -> (TempDir, StoryConfig) {
    let workspace = TempDir::new().unwrap();
    let notes_dir = workspace.path().join("notes");
    std::fs::create_dir_all(&notes_dir).unwrap();
    std::fs::write(notes_dir.join("dictation-1.txt"), notes).unwrap();
    (workspace, StoryConfig::default())
}

/// Run `f` with the given environment variables set and an isolated user config dir.
/// Variables are restored afterwards; the mutex serializes env access across tests.
pub fn with_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock();

    let config_home = test_dir.path().join("xdg-config");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&home).unwrap();

    let mut touched: Vec<(String, Option<String>)> = Vec::new();
    let mut set = |key: &str, value: &str| {
        touched.push((key.to_string(), std::env::var(key).ok()));
        std::env::set_var(key, value);
    };
    set("HOME", home.to_str().unwrap());
    set("XDG_CONFIG_HOME", config_home.to_str().unwrap());
    for (key, value) in vars {
        set(key, value);
    }

    let result = f();

    for (key, original) in touched.into_iter().rev() {
        match original {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}
