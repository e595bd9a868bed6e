//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global → Local: REPLACE per key (unset keys inherit)
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;

use tempfile::TempDir;

use blocktree::application::ApplicationError;
use blocktree::config::{local_config_path, Settings};
use blocktree::domain::IndexPolicy;

fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

// ============================================================
// Settings::load() local config tests
// ============================================================

#[test]
fn given_local_config_with_scalars_when_load_then_overrides_defaults() {
    // Arrange
    let doc_dir = TempDir::new().unwrap();
    let local_config = r#"
index_policy = "clamp"
enforce_unique_ids = true
"#;
    fs::write(local_config_path(doc_dir.path()), local_config).unwrap();

    // Act
    let settings = Settings::load(Some(doc_dir.path())).expect("load settings");

    // Assert: specified keys replaced, unspecified key inherited
    assert_eq!(settings.index_policy, IndexPolicy::Clamp);
    assert!(settings.enforce_unique_ids);
    assert!(settings.pretty, "pretty should keep its default");
}

#[test]
fn given_no_local_config_when_load_then_defaults() {
    let doc_dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(doc_dir.path())).expect("load settings");

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    let doc_dir = TempDir::new().unwrap();
    fs::write(local_config_path(doc_dir.path()), "index_policy = \"wrap\"\n").unwrap();

    let result = Settings::load(Some(doc_dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_local_config_when_engine_built_then_follows_settings() {
    let doc_dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(doc_dir.path()),
        "index_policy = \"clamp\"\nenforce_unique_ids = true\n",
    )
    .unwrap();

    let engine = Settings::load(Some(doc_dir.path())).unwrap().engine();

    assert_eq!(engine.index_policy(), IndexPolicy::Clamp);
    assert!(engine.enforces_unique_ids());
}

// ============================================================
// Environment overrides
// ============================================================

#[test]
fn given_env_vars_when_applied_then_override_file_values() {
    let base = Settings {
        index_policy: IndexPolicy::Clamp,
        enforce_unique_ids: false,
        pretty: true,
    };

    let settings = Settings::apply_env_overrides(
        base,
        env(&[
            ("BLOCKTREE_INDEX_POLICY", "strict"),
            ("BLOCKTREE_PRETTY", "false"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.index_policy, IndexPolicy::Strict);
    assert!(!settings.pretty);
    assert!(!settings.enforce_unique_ids, "unset env var must not override");
}

#[test]
fn given_unrelated_env_vars_when_applied_then_settings_unchanged() {
    let settings =
        Settings::apply_env_overrides(Settings::default(), env(&[("HOME", "/tmp")])).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn given_unknown_index_policy_in_env_when_applied_then_config_error() {
    let result =
        Settings::apply_env_overrides(Settings::default(), env(&[("BLOCKTREE_INDEX_POLICY", "wrap")]));
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

// ============================================================
// Output
// ============================================================

#[test]
fn given_settings_when_rendered_as_toml_then_reparses_to_same_values() {
    let settings = Settings {
        index_policy: IndexPolicy::Clamp,
        enforce_unique_ids: true,
        pretty: false,
    };

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
    assert!(rendered.contains("index_policy = \"clamp\""));
}
