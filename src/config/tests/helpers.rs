//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use mockable::MockEnv;
use ortho_config::MergeComposer;
use rstest::fixture;

use crate::config::AppConfig;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        binary = "podman"
        context = "remote-prod"
        working_dir = "/srv/app"

        [retry]
        timeout_secs = 10
        initial_backoff_ms = 100
        max_backoff_ms = 800

        [wait]
        timeout_secs = 45
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        context = "staging"

        [retry]
        max_backoff_ms = 5000
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Environment answering `DOCKER_CONTEXT` with `value` and nothing else.
pub fn env_with_docker_context(value: Option<&'static str>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| {
        (key == "DOCKER_CONTEXT")
            .then(|| value.map(String::from))
            .flatten()
    });
    env
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.binary.is_none(), "binary should be None");
    assert_eq!(config.binary(), "docker");
    assert!(config.context.is_none(), "context should be None");
    assert!(config.working_dir.is_none(), "working_dir should be None");
    assert_eq!(config.retry.timeout_secs, 30);
    assert_eq!(config.retry.initial_backoff_ms, 250);
    assert_eq!(config.retry.max_backoff_ms, 2000);
    assert_eq!(config.wait.timeout_secs, 120);
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "binary": "podman",
            "context": "from-file",
            "retry": { "timeout_secs": 12 }
        }),
        None,
    );

    composer.push_environment(json!({
        "context": "from-env",
        "retry": { "max_backoff_ms": 900 }
    }));

    Ok(composer)
}
