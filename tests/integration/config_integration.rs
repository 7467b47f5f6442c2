//! Integration tests for configuration layering

use super::test_utils::with_env;
use taleweaver::config::{ConfigLoader, ProviderType, RunOverrides};
use tempfile::TempDir;

fn write_workspace_config(workspace: &TempDir, name: &str, contents: &str) {
    let dir = workspace.path().join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let workspace = TempDir::new().unwrap();
    let config = with_env(&workspace, &[], || ConfigLoader::load(workspace.path()).unwrap());

    assert_eq!(config.provider.provider_type, ProviderType::OpenAI);
    assert_eq!(config.story.output_dir.to_str(), Some("results"));
    assert!(config.story.max_parallel.is_none());
    assert!(!config.retrieval.enabled);
    assert_eq!(config.retrieval.base_url, "http://localhost:3001");
    assert!(config.story.structure_template.contains("Epilogue"));
}

#[test]
fn test_profile_file_overrides_base_file() {
    let workspace = TempDir::new().unwrap();
    write_workspace_config(
        &workspace,
        "config.toml",
        r#"
[provider]
provider_type = "ollama"
model = "llama3"

[story]
structure_template = "base template"
max_parallel = 2
"#,
    );
    write_workspace_config(
        &workspace,
        "staging.toml",
        "[story]\nstructure_template = \"staging template\"\n",
    );

    let config = with_env(&workspace, &[("TALEWEAVER_ENV", "staging")], || {
        ConfigLoader::load(workspace.path()).unwrap()
    });
    assert_eq!(config.provider.provider_type, ProviderType::Ollama);
    assert_eq!(config.provider.model, "llama3");
    assert_eq!(config.story.structure_template, "staging template");
    assert_eq!(config.story.max_parallel, Some(2));
}

#[test]
fn test_environment_overrides_files() {
    let workspace = TempDir::new().unwrap();
    write_workspace_config(
        &workspace,
        "config.toml",
        "[provider]\nmodel = \"from-file\"\n\n[retrieval]\ntop_k = 2\n",
    );

    let config = with_env(
        &workspace,
        &[
            ("TALEWEAVER_PROVIDER__MODEL", "from-env"),
            ("TALEWEAVER_RETRIEVAL__TOP_K", "8"),
            ("RAG_BASE_URL", "http://rag.internal:4000"),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );
    assert_eq!(config.provider.model, "from-env");
    assert_eq!(config.retrieval.top_k, 8);
    assert_eq!(config.retrieval.base_url, "http://rag.internal:4000");
}

#[test]
fn test_structure_variable_and_run_overrides_precedence() {
    let workspace = TempDir::new().unwrap();
    write_workspace_config(
        &workspace,
        "config.toml",
        "[story]\nstructure_template = \"from file\"\n",
    );

    let from_env = with_env(
        &workspace,
        &[("STORY_STRUCTURE", "from STORY_STRUCTURE")],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );
    assert_eq!(from_env.story.structure_template, "from STORY_STRUCTURE");

    let mut overrides = RunOverrides::new();
    overrides.insert(
        "story.structure_template".to_string(),
        "from --set".to_string(),
    );
    let from_run = with_env(
        &workspace,
        &[("STORY_STRUCTURE", "from STORY_STRUCTURE")],
        || ConfigLoader::load_with_overrides(workspace.path(), &overrides).unwrap(),
    );
    assert_eq!(from_run.story.structure_template, "from --set");
}

#[cfg(target_os = "linux")]
#[test]
fn test_user_level_file_sits_below_workspace_file() {
    let workspace = TempDir::new().unwrap();
    let user_dir = workspace.path().join("xdg-config").join("taleweaver");
    std::fs::create_dir_all(&user_dir).unwrap();
    std::fs::write(
        user_dir.join("config.toml"),
        "[provider]\nmodel = \"user-model\"\n\n[retrieval]\nenabled = true\n",
    )
    .unwrap();
    write_workspace_config(&workspace, "config.toml", "[provider]\nmodel = \"workspace-model\"\n");

    let config = with_env(&workspace, &[], || ConfigLoader::load(workspace.path()).unwrap());
    assert_eq!(config.provider.model, "workspace-model");
    assert!(config.retrieval.enabled);
}

#[test]
fn test_invalid_values_are_reported_together() {
    let workspace = TempDir::new().unwrap();
    write_workspace_config(
        &workspace,
        "config.toml",
        "[provider]\nmodel = \"\"\n\n[retrieval]\nenabled = true\ntop_k = 0\n\n[story]\nmax_parallel = 0\n",
    );

    let config = with_env(&workspace, &[], || ConfigLoader::load(workspace.path()).unwrap());
    let errors = config.validate().unwrap_err();
    assert!(errors.len() >= 3);
}
