use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::autosave::AutoSaveConfig;
use crate::text::LanguageMode;

/// Top-level wizard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub autosave: AutoSaveConfig,
    /// Default display language for hosts that do not pass one explicitly.
    pub language: LanguageMode,
}

impl WizardConfig {
    /// Load configuration from `~/.config/taxwizard/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "failed to parse config at {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "no config file at {}, using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("taxwizard").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
