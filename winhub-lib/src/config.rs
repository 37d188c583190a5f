use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for winhub data (settings, presets, caches)
    pub data_dir: PathBuf,

    /// Directory for cached release listings
    pub cache_dir: PathBuf,

    /// The platform Downloads directory; the user-chosen subfolder is
    /// joined onto it per download
    pub downloads_root: PathBuf,

    /// Path to the persisted user settings
    pub settings_path: PathBuf,

    /// Path to the local game-setting preset store
    pub presets_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::new_for_paths(&Self::default_data_dir(), &Self::default_downloads_root())
    }
}

impl Config {
    pub fn new_for_paths(data_dir: &Path, downloads_root: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cache_dir: data_dir.join("cache"),
            downloads_root: downloads_root.to_path_buf(),
            settings_path: data_dir.join("settings.toml"),
            presets_path: data_dir.join("presets.json"),
        }
    }

    /// Sets up a Config for the given directories, creating them as
    /// needed. See also [Self::default_data_dir].
    pub fn setup(data_dir: Option<&Path>, downloads_root: Option<&Path>) -> Result<Self> {
        let data_dir = data_dir
            .map(|d| d.to_path_buf())
            .unwrap_or_else(Self::default_data_dir);
        let downloads_root = downloads_root
            .map(|d| d.to_path_buf())
            .unwrap_or_else(Self::default_downloads_root);
        let config = Self::new_for_paths(&data_dir, &downloads_root);

        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.cache_dir)?;

        Ok(config)
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
            .join("winhub")
    }

    pub fn default_downloads_root() -> PathBuf {
        dirs::download_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join("Downloads"))
    }

    /// Where downloads land for the configured subfolder name.
    pub fn download_dir(&self, subdir: &str) -> PathBuf {
        if subdir.is_empty() {
            self.downloads_root.clone()
        } else {
            self.downloads_root.join(subdir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_setup_creates_directories() -> Result<()> {
        let tmp_dir = TempDir::new()?;
        let data = tmp_dir.path().join("data");
        let downloads = tmp_dir.path().join("downloads");

        let config = Config::setup(Some(&data), Some(&downloads))?;

        assert!(config.data_dir.is_dir());
        assert!(config.cache_dir.is_dir());
        assert_eq!(config.settings_path, data.join("settings.toml"));
        assert_eq!(config.download_dir("WinlatorHub"), downloads.join("WinlatorHub"));
        assert_eq!(config.download_dir(""), downloads);
        Ok(())
    }
}
