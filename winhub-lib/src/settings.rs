use crate::config::Config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DOWNLOAD_SUBDIR: &str = "WinlatorHub";

/// Persisted user preferences, stored as `settings.toml` in the data
/// directory.
///
/// `user_id` is generated once per install and identifies community
/// preset submissions; it is never derived from anything personal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub download_subdir: String,
    pub custom_repo_url: String,
    pub user_id: String,
    pub setup_complete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_subdir: DEFAULT_DOWNLOAD_SUBDIR.to_string(),
            custom_repo_url: String::new(),
            user_id: uuid::Uuid::new_v4().to_string(),
            setup_complete: false,
        }
    }
}

impl Settings {
    /// Load the settings file, or create it with defaults (and a fresh
    /// user id) on first run.
    pub fn load(config: &Config) -> Result<Self> {
        if !config.settings_path.exists() {
            let settings = Self::default();
            settings.save(config)?;
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config.settings_path)
            .with_context(|| format!("Failed to read {}", config.settings_path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Malformed settings file {}", config.settings_path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = config.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config.settings_path, content)
            .with_context(|| format!("Failed to write {}", config.settings_path.display()))?;
        Ok(())
    }
}
