//! Config loader facade: assembles sources in precedence order and deserializes.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::StoryConfig;
use crate::error::ApiError;
use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::collections::BTreeMap;
use std::path::Path;

/// Per-run overrides (`section.key` -> value), applied above every other source.
pub type RunOverrides = BTreeMap<String, String>;

/// Parse a `key=value` override. The key must be a dotted config path.
pub fn parse_override(raw: &str) -> Result<(String, String), ApiError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        ApiError::ConfigError(format!("Override '{}' must look like key=value", raw))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ApiError::ConfigError(format!(
            "Override '{}' has an empty key",
            raw
        )));
    }
    Ok((key.to_string(), value.to_string()))
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, user-level file, workspace files,
    /// environment, `STORY_STRUCTURE`.
    pub fn load(workspace_root: &Path) -> Result<StoryConfig, ApiError> {
        Self::load_with_overrides(workspace_root, &RunOverrides::new())
    }

    pub fn load_with_overrides(
        workspace_root: &Path,
        overrides: &RunOverrides,
    ) -> Result<StoryConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder, overrides)
    }

    /// Load from an explicit file, skipping user-level and workspace discovery.
    pub fn load_from_file(path: &Path) -> Result<StoryConfig, ApiError> {
        Self::load_from_file_with_overrides(path, &RunOverrides::new())
    }

    pub fn load_from_file_with_overrides(
        path: &Path,
        overrides: &RunOverrides,
    ) -> Result<StoryConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        Self::finish(builder, overrides)
    }

    fn finish(
        builder: ConfigBuilder<DefaultState>,
        overrides: &RunOverrides,
    ) -> Result<StoryConfig, ApiError> {
        let mut builder = merge_policy::add_environment(builder)?;
        for (key, value) in overrides {
            builder = builder.set_override(key.as_str(), value.as_str())?;
        }
        let config: StoryConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}
