//! Config loader facade: assembles sources in precedence order and deserializes.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::{VitrineConfig, API_KEY_ENV};
use crate::error::MediaError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, `config/{VITRINE_ENV}.toml`, `VITRINE__*`
    /// variables, `VITRINE_API_KEY`.
    pub fn load(workspace_root: &Path) -> Result<VitrineConfig, MediaError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: VitrineConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(Self::apply_api_key_env(config))
    }

    /// Load configuration from a single explicit file, plus environment overrides.
    pub fn load_from_file(path: &Path) -> Result<VitrineConfig, MediaError> {
        if !path.exists() {
            return Err(MediaError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?.add_source(File::from(path));
        let builder = environment::add_to_builder(builder);

        let config: VitrineConfig = builder.build()?.try_deserialize()?;
        Ok(Self::apply_api_key_env(config))
    }

    /// Location of the user-level config file, if one can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn apply_api_key_env(mut config: VitrineConfig) -> VitrineConfig {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.service.api_key = Some(key);
            }
        }
        config
    }
}
