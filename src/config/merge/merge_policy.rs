//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "TALEWEAVER";

/// Single-variable override for the structure template, kept for existing setups.
pub const ENV_STRUCTURE_TEMPLATE: &str = "STORY_STRUCTURE";

/// Single-variable override for the retrieval service base URL.
pub const ENV_RETRIEVAL_URL: &str = "RAG_BASE_URL";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("story.notes_dir", "notes")?
        .set_default("story.output_dir", "results")?
        .set_default("retrieval.enabled", false)?
        .set_default("retrieval.base_url", "http://localhost:3001")?
        .set_default("retrieval.top_k", 5)?
        .set_default("retrieval.timeout_secs", 20)
}

/// Environment layer: TALEWEAVER_SECTION__KEY maps to section.key.
pub fn add_environment(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    if let Ok(template) = std::env::var(ENV_STRUCTURE_TEMPLATE) {
        if !template.trim().is_empty() {
            builder = builder.set_override("story.structure_template", template)?;
        }
    }

    if let Ok(base_url) = std::env::var(ENV_RETRIEVAL_URL) {
        if !base_url.trim().is_empty() {
            builder = builder.set_override("retrieval.base_url", base_url)?;
        }
    }

    Ok(builder)
}
