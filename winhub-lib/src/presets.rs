use crate::backend::RemotePreset;
use crate::config::Config;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

fn default_format() -> String {
    "Preinstalled".to_string()
}

fn default_audio_driver() -> String {
    "alsa".to_string()
}

/// A locally saved game configuration: which Winlator build a game runs
/// on and the container knobs that made it work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub format: String,
    pub device: String,
    pub gamepad: String,
    pub winlator_version: String,
    pub winlator_repo_owner: String,
    pub winlator_repo_name: String,
    pub winlator_tag_name: String,
    pub winlator_asset_name: String,
    pub graphics: String,
    pub wine: String,
    pub box64: String,
    pub box64_preset: String,
    pub resolution: String,
    pub gpu_driver: String,
    pub dxvk: String,
    pub audio_driver: String,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            format: default_format(),
            device: String::new(),
            gamepad: "No".to_string(),
            winlator_version: String::new(),
            winlator_repo_owner: String::new(),
            winlator_repo_name: String::new(),
            winlator_tag_name: String::new(),
            winlator_asset_name: String::new(),
            graphics: String::new(),
            wine: String::new(),
            box64: String::new(),
            box64_preset: String::new(),
            resolution: String::new(),
            gpu_driver: String::new(),
            dxvk: String::new(),
            audio_driver: default_audio_driver(),
        }
    }
}

impl Preset {
    /// Shape a preset for the community moderation queue.
    pub fn to_submission(&self, user_id: &str, youtube_url: &str) -> RemotePreset {
        RemotePreset {
            name: self.name.clone(),
            format: self.format.clone(),
            device: self.device.clone(),
            gamepad: self.gamepad.clone(),
            winlator_version: self.winlator_version.clone(),
            winlator_repo_owner: self.winlator_repo_owner.clone(),
            winlator_repo_name: self.winlator_repo_name.clone(),
            winlator_tag_name: self.winlator_tag_name.clone(),
            winlator_asset_name: self.winlator_asset_name.clone(),
            graphics: self.graphics.clone(),
            wine: self.wine.clone(),
            box64: self.box64.clone(),
            box64_preset: self.box64_preset.clone(),
            resolution: self.resolution.clone(),
            gpu_driver: self.gpu_driver.clone(),
            dxvk: self.dxvk.clone(),
            audio_driver: self.audio_driver.clone(),
            submitted_by: user_id.to_string(),
            youtube_url: youtube_url.to_string(),
            ..RemotePreset::default()
        }
    }

    /// Import a community row into the local store under a fresh id.
    pub fn from_remote(remote: &RemotePreset) -> Self {
        Self {
            name: remote.name.clone(),
            format: remote.format.clone(),
            device: remote.device.clone(),
            gamepad: remote.gamepad.clone(),
            winlator_version: remote.winlator_version.clone(),
            winlator_repo_owner: remote.winlator_repo_owner.clone(),
            winlator_repo_name: remote.winlator_repo_name.clone(),
            winlator_tag_name: remote.winlator_tag_name.clone(),
            winlator_asset_name: remote.winlator_asset_name.clone(),
            graphics: remote.graphics.clone(),
            wine: remote.wine.clone(),
            box64: remote.box64.clone(),
            box64_preset: remote.box64_preset.clone(),
            resolution: remote.resolution.clone(),
            gpu_driver: remote.gpu_driver.clone(),
            dxvk: remote.dxvk.clone(),
            audio_driver: remote.audio_driver.clone(),
            ..Self::default()
        }
    }
}

/// JSON-file backed preset collection, newest first.
pub struct PresetStore {
    config: Config,
}

impl PresetStore {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn list(&self) -> Result<Vec<Preset>> {
        if !self.config.presets_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.config.presets_path)
            .with_context(|| format!("Failed to read {}", self.config.presets_path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Find a preset by its id or (exact, case-insensitive) name.
    pub fn find(&self, id_or_name: &str) -> Result<Preset> {
        let presets = self.list()?;
        presets
            .into_iter()
            .find(|p| p.id == id_or_name || p.name.eq_ignore_ascii_case(id_or_name))
            .with_context(|| format!("No saved preset named '{id_or_name}'"))
    }

    /// Insert or replace (by id) a preset at the front of the list.
    pub fn save(&self, preset: &Preset) -> Result<()> {
        let mut presets = self.list()?;
        presets.retain(|p| p.id != preset.id);
        presets.insert(0, preset.clone());
        self.write(&presets)
    }

    pub fn remove(&self, id_or_name: &str) -> Result<Preset> {
        let removed = self.find(id_or_name)?;
        let mut presets = self.list()?;
        presets.retain(|p| p.id != removed.id);
        self.write(&presets)?;
        Ok(removed)
    }

    fn write(&self, presets: &[Preset]) -> Result<()> {
        if let Some(parent) = self.config.presets_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(presets)?;
        std::fs::write(&self.config.presets_path, content)?;
        Ok(())
    }
}

/// Validates a preset before submission: nameless or sourceless rows
/// only clutter the moderation queue.
pub fn validate_for_submission(preset: &Preset) -> Result<()> {
    if preset.name.trim().is_empty() {
        bail!("The preset needs a name before it can be submitted.");
    }
    if preset.winlator_repo_owner.is_empty() || preset.winlator_repo_name.is_empty() {
        bail!("The preset does not say which Winlator build it was tested on.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp_dir: &TempDir) -> PresetStore {
        let config = Config::setup(
            Some(&tmp_dir.path().join("data")),
            Some(&tmp_dir.path().join("downloads")),
        )
        .unwrap();
        PresetStore::new(&config)
    }

    fn preset(name: &str) -> Preset {
        Preset {
            name: name.to_string(),
            device: "Poco F5".to_string(),
            winlator_repo_owner: "brunodev85".to_string(),
            winlator_repo_name: "winlator".to_string(),
            winlator_tag_name: "v10.1".to_string(),
            ..Preset::default()
        }
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let tmp_dir = TempDir::new().unwrap();
        assert!(store(&tmp_dir).list().unwrap().is_empty());
    }

    #[test]
    fn test_save_find_remove_roundtrip() -> Result<()> {
        let tmp_dir = TempDir::new().unwrap();
        let store = store(&tmp_dir);

        let first = preset("GTA San Andreas");
        let second = preset("Skyrim");
        store.save(&first)?;
        store.save(&second)?;

        // Newest first.
        let listed = store.list()?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Skyrim");

        assert_eq!(store.find("gta san andreas")?.id, first.id);
        assert_eq!(store.find(&second.id)?.name, "Skyrim");

        store.remove("Skyrim")?;
        assert_eq!(store.list()?.len(), 1);
        assert!(store.find("Skyrim").is_err());
        Ok(())
    }

    #[test]
    fn test_save_replaces_same_id() -> Result<()> {
        let tmp_dir = TempDir::new().unwrap();
        let store = store(&tmp_dir);

        let mut p = preset("Original");
        store.save(&p)?;
        p.name = "Renamed".to_string();
        store.save(&p)?;

        let listed = store.list()?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Renamed");
        Ok(())
    }

    #[test]
    fn test_submission_carries_identity_and_link() {
        let p = preset("Doom");
        let remote = p.to_submission("user-123", "https://youtu.be/abc");
        assert_eq!(remote.submitted_by, "user-123");
        assert_eq!(remote.youtube_url, "https://youtu.be/abc");
        assert_eq!(remote.status, "pending");
        assert_eq!(remote.winlator_repo_owner, "brunodev85");
    }

    #[test]
    fn test_validation_rejects_incomplete_presets() {
        let mut p = preset("");
        assert!(validate_for_submission(&p).is_err());
        p.name = "Named".to_string();
        p.winlator_repo_owner = String::new();
        assert!(validate_for_submission(&p).is_err());

        assert!(validate_for_submission(&preset("Complete")).is_ok());
    }

    #[test]
    fn test_from_remote_gets_fresh_id() {
        let remote = RemotePreset {
            name: "Portal".to_string(),
            device: "Tab S9".to_string(),
            ..RemotePreset::default()
        };
        let a = Preset::from_remote(&remote);
        let b = Preset::from_remote(&remote);
        assert_eq!(a.name, "Portal");
        assert_ne!(a.id, b.id);
    }
}
