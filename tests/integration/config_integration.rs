//! Integration tests for Configuration System

use crate::integration::test_utils::with_isolated_env;
use std::fs;
use tempfile::TempDir;
use vitrine::cell::SharingMode;
use vitrine::config::{ConfigLoader, ValidationError};

fn write_workspace_config(root: &std::path::Path, name: &str, contents: &str) {
    let dir = root.join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_layers_apply_in_precedence_order() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    with_isolated_env(&temp_dir, || {
        let global_dir = temp_dir.path().join("xdg").join("vitrine");
        fs::create_dir_all(&global_dir).unwrap();
        fs::write(
            global_dir.join("config.toml"),
            r#"
sharing = "coalesced"

[service]
model = "global-model"
api_key = "global-key"

[retry]
base_delay_ms = 500
"#,
        )
        .unwrap();

        write_workspace_config(
            &workspace,
            "config.toml",
            "[service]\nmodel = \"workspace-model\"\n\n[marquee]\nslow_secs = 90\n",
        );
        write_workspace_config(&workspace, "staging.toml", "[marquee]\nslow_secs = 120\n");

        std::env::set_var("VITRINE_ENV", "staging");
        std::env::set_var("VITRINE__RETRY__MAX_RETRIES", "2");
        std::env::set_var("VITRINE_API_KEY", "env-key");

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.sharing, SharingMode::Coalesced);
        assert_eq!(config.service.model, "workspace-model");
        assert_eq!(config.retry.base_delay_ms, 500);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.marquee.slow_secs, 120);
        assert_eq!(config.service.api_key.as_deref(), Some("env-key"));
        assert!(config.validate().is_ok());
    });
}

#[test]
fn test_defaults_without_any_files() {
    let temp_dir = TempDir::new().unwrap();
    with_isolated_env(&temp_dir, || {
        let config = ConfigLoader::load(temp_dir.path()).unwrap();
        assert_eq!(config.sharing, SharingMode::Independent);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.service.api_key, None);
        assert_eq!(config.service.api_key_status(), "not set");
        assert_eq!(config.marquee.reverse_secs, 60);
        assert_eq!(config.reveal.duration_ms, 1200);
    });
}

#[test]
fn test_invalid_values_are_reported_together() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("broken.toml");
    fs::write(
        &config_file,
        r#"
[retry]
max_retries = 40

[reveal]
threshold = 2.0

[logging]
format = "yaml"
"#,
    )
    .unwrap();

    with_isolated_env(&temp_dir, || {
        let config = ConfigLoader::load_from_file(&config_file).unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::Retry(_)));
        assert!(matches!(errors[1], ValidationError::Reveal(_)));
        assert!(matches!(errors[2], ValidationError::Logging(_)));
    });
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}
