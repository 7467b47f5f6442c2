//! CLI route: single route table and run context. Dispatches to `run` and presentation.

use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{
    format_config, format_generate_summary, format_plan_json, format_plan_text,
};
use crate::config::{parse_override, ConfigLoader, RunOverrides, StoryConfig};
use crate::error::ApiError;
use crate::run::{run_generate, run_plan_preview, GenerateRequest};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runtime context for CLI execution: workspace root and optional explicit config file.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        if !workspace_root.is_dir() {
            return Err(ApiError::ConfigError(format!(
                "Workspace directory not found: {}",
                workspace_root.display()
            )));
        }
        Ok(Self {
            workspace_root,
            config_path,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Load configuration with per-run `key=value` overrides on top.
    pub fn load_config(&self, overrides: &[String]) -> Result<StoryConfig, ApiError> {
        let overrides = overrides
            .iter()
            .map(|raw| parse_override(raw))
            .collect::<Result<RunOverrides, ApiError>>()?;
        let config = match &self.config_path {
            Some(path) => ConfigLoader::load_from_file_with_overrides(path, &overrides)?,
            None => ConfigLoader::load_with_overrides(&self.workspace_root, &overrides)?,
        };
        debug!(overrides = overrides.len(), "Configuration loaded");
        Ok(config)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate {
                notes,
                urls,
                output,
                structure_file,
                overrides,
                max_parallel,
            } => {
                let config = self.load_config(overrides)?;
                let structure_template = match structure_file {
                    Some(path) => Some(read_structure_file(path)?),
                    None => None,
                };
                if *max_parallel == Some(0) {
                    return Err(ApiError::ConfigError(
                        "--max-parallel must be at least 1".to_string(),
                    ));
                }
                let request = GenerateRequest {
                    notes: notes.clone(),
                    urls: urls.clone(),
                    output: output.clone(),
                    structure_template,
                    max_parallel: *max_parallel,
                };
                let report = run_generate(&config, &self.workspace_root, &request)?;
                Ok(format_generate_summary(&report))
            }
            Commands::Plan {
                notes,
                format,
                overrides,
            } => {
                let config = self.load_config(overrides)?;
                let plan = run_plan_preview(&config, &self.workspace_root, notes)?;
                match format.as_str() {
                    "json" => format_plan_json(&plan),
                    "text" => Ok(format_plan_text(&plan)),
                    other => Err(ApiError::ConfigError(format!(
                        "Unknown format '{}'; expected text or json",
                        other
                    ))),
                }
            }
            Commands::Config {
                command: ConfigCommands::Show { format, overrides },
            } => {
                let config = self.load_config(overrides)?;
                format_config(&config, format)
            }
        }
    }
}

fn read_structure_file(path: &Path) -> Result<String, ApiError> {
    let template = std::fs::read_to_string(path)?;
    if template.trim().is_empty() {
        return Err(ApiError::ConfigError(format!(
            "Structure file is empty: {}",
            path.display()
        )));
    }
    Ok(template)
}
