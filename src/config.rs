//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/blocktree/blocktree.toml`
//! 3. Local config: `<document_dir>/.blocktree.toml`
//! 4. Environment variables: `BLOCKTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{IndexPolicy, TreeEngine};

/// Unified configuration for blocktree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// How out-of-range positions are handled (default: strict)
    pub index_policy: IndexPolicy,
    /// Reject inserts that would repeat an existing block id (default: false)
    pub enforce_unique_ids: bool,
    /// Pretty-print written documents (default: true)
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_policy: IndexPolicy::Strict,
            enforce_unique_ids: false,
            pretty: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub index_policy: Option<IndexPolicy>,
    pub enforce_unique_ids: Option<bool>,
    pub pretty: Option<bool>,
}

/// Get the XDG config directory for blocktree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "blocktree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("blocktree.toml"))
}

/// Get the path to the local config file next to a document.
pub fn local_config_path(document_dir: &Path) -> PathBuf {
    document_dir.join(".blocktree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Engine configured from these settings.
    pub fn engine(&self) -> TreeEngine {
        TreeEngine::new()
            .with_index_policy(self.index_policy)
            .with_unique_ids(self.enforce_unique_ids)
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            index_policy: overlay.index_policy.unwrap_or(self.index_policy),
            enforce_unique_ids: overlay.enforce_unique_ids.unwrap_or(self.enforce_unique_ids),
            pretty: overlay.pretty.unwrap_or(self.pretty),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `document_dir` - Optional directory of the edited document, for local config
    pub fn load(document_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = document_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("load: local config {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current, None)
    }

    /// Apply BLOCKTREE_* environment variables as explicit overrides.
    ///
    /// `source` replaces the process environment (used by tests).
    pub fn apply_env_overrides(
        mut settings: Self,
        source: Option<config::Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("BLOCKTREE")
                    .prefix_separator("_")
                    .separator("__")
                    .source(source),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("index_policy") {
            settings.index_policy = parse_index_policy(&val)?;
        }
        if let Ok(val) = config.get_bool("enforce_unique_ids") {
            settings.enforce_unique_ids = val;
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }

        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}

fn parse_index_policy(value: &str) -> Result<IndexPolicy, ApplicationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(IndexPolicy::Strict),
        "clamp" => Ok(IndexPolicy::Clamp),
        other => Err(ApplicationError::Config {
            message: format!("unknown index_policy '{other}' (expected 'strict' or 'clamp')"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
