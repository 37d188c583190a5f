//! Typed request/response client for the hosted REST backend
//! (PostgREST + GoTrue). No retry or backoff: callers surface errors
//! straight to the user.

use anyhow::{Context, Result, bail};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};

pub const HOSTED_URL: &str = "https://jbqaegcuitmqfwpsdazn.supabase.co";
pub const PUBLISHABLE_KEY: &str = "sb_publishable_TaCuv4LHD-oHAH_jEuqvyQ_BAqV9fbk";

/// Version code of this build; the backend's `latest_version` beyond
/// this means an update is available.
pub const APP_VERSION_CODE: i64 = 3;

/// Remotely managed announcement and update information, shown on
/// startup by the original app and by `winhub status` here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub dialog_title: String,
    pub dialog_message: String,
    pub show_dialog: bool,
    #[serde(default)]
    pub is_update: bool,
    #[serde(default)]
    pub update_url: String,
    #[serde(default = "default_latest_version")]
    pub latest_version: i64,
}

fn default_latest_version() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteRepo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<i64>,
}

fn default_audio_driver() -> String {
    "alsa".to_string()
}

fn default_status() -> String {
    "pending".to_string()
}

/// A community game-setting row. Column-for-column what the backend
/// stores; moderation flips `status` between `pending`, `approved` and
/// `rejected`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemotePreset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub format: String,
    pub device: String,
    pub gamepad: String,
    pub winlator_version: String,
    pub winlator_repo_owner: String,
    pub winlator_repo_name: String,
    pub winlator_tag_name: String,
    pub winlator_asset_name: String,
    pub winlator_download_url: String,
    pub wine_repo_owner: String,
    pub wine_repo_name: String,
    pub wine_tag_name: String,
    pub wine_asset_name: String,
    pub box64_repo_owner: String,
    pub box64_repo_name: String,
    pub box64_tag_name: String,
    pub box64_asset_name: String,
    pub gpu_driver_repo_owner: String,
    pub gpu_driver_repo_name: String,
    pub gpu_driver_tag_name: String,
    pub gpu_driver_asset_name: String,
    pub dxvk_repo_owner: String,
    pub dxvk_repo_name: String,
    pub dxvk_tag_name: String,
    pub dxvk_asset_name: String,
    pub graphics: String,
    pub wine: String,
    pub box64: String,
    pub box64_preset: String,
    pub resolution: String,
    pub gpu_driver: String,
    pub dxvk: String,
    pub audio_driver: String,
    pub submitted_by: String,
    pub youtube_url: String,
    pub status: String,
}

impl Default for RemotePreset {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            format: String::new(),
            device: String::new(),
            gamepad: String::new(),
            winlator_version: String::new(),
            winlator_repo_owner: String::new(),
            winlator_repo_name: String::new(),
            winlator_tag_name: String::new(),
            winlator_asset_name: String::new(),
            winlator_download_url: String::new(),
            wine_repo_owner: String::new(),
            wine_repo_name: String::new(),
            wine_tag_name: String::new(),
            wine_asset_name: String::new(),
            box64_repo_owner: String::new(),
            box64_repo_name: String::new(),
            box64_tag_name: String::new(),
            box64_asset_name: String::new(),
            gpu_driver_repo_owner: String::new(),
            gpu_driver_repo_name: String::new(),
            gpu_driver_tag_name: String::new(),
            gpu_driver_asset_name: String::new(),
            dxvk_repo_owner: String::new(),
            dxvk_repo_name: String::new(),
            dxvk_tag_name: String::new(),
            dxvk_asset_name: String::new(),
            graphics: String::new(),
            wine: String::new(),
            box64: String::new(),
            box64_preset: String::new(),
            resolution: String::new(),
            gpu_driver: String::new(),
            dxvk: String::new(),
            audio_driver: default_audio_driver(),
            submitted_by: String::new(),
            youtube_url: String::new(),
            status: default_status(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

pub struct BackendClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl BackendClient {
    /// Client against the hosted backend every install talks to.
    pub fn hosted() -> Self {
        Self::new(HOSTED_URL, PUBLISHABLE_KEY)
    }

    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .user_agent(concat!("winhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(bearer.unwrap_or(&self.api_key))
    }

    fn expect_success(response: Response, what: &str) -> Result<Response> {
        if !response.status().is_success() {
            bail!("Backend request failed ({what}): {}", response.status());
        }
        Ok(response)
    }

    /// The single app-config row, or None when the table is empty.
    pub async fn app_config(&self) -> Result<Option<AppConfig>> {
        let response = self
            .request(Method::GET, "rest/v1/app_config?select=*", None)
            .send()
            .await
            .context("Backend is unreachable")?;
        let rows: Vec<AppConfig> = Self::expect_success(response, "app config")?
            .json()
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let response = self
            .request(Method::GET, "rest/v1/categories?select=*", None)
            .send()
            .await
            .context("Backend is unreachable")?;
        Ok(Self::expect_success(response, "categories")?
            .json()
            .await?)
    }

    pub async fn repositories(&self) -> Result<Vec<RemoteRepo>> {
        let response = self
            .request(Method::GET, "rest/v1/repositories?select=*", None)
            .send()
            .await
            .context("Backend is unreachable")?;
        Ok(Self::expect_success(response, "repositories")?
            .json()
            .await?)
    }

    /// Community presets that passed moderation, newest first.
    pub async fn approved_presets(&self) -> Result<Vec<RemotePreset>> {
        let response = self
            .request(
                Method::GET,
                "rest/v1/game_settings?status=eq.approved&select=*&order=id.desc",
                None,
            )
            .send()
            .await
            .context("Backend is unreachable")?;
        Ok(Self::expect_success(response, "community presets")?
            .json()
            .await?)
    }

    /// Submit a preset for moderation. The row always enters the queue
    /// as `pending`, whatever the caller put in `status`.
    pub async fn submit_preset(&self, preset: &RemotePreset) -> Result<()> {
        let submission = RemotePreset {
            id: None,
            status: default_status(),
            ..preset.clone()
        };
        let response = self
            .request(Method::POST, "rest/v1/game_settings", None)
            .json(&submission)
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "preset submission")?;
        Ok(())
    }

    /// Password login for panel operations; returns the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token?grant_type=password", self.base_url))
            .header("apikey", &self.api_key)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .context("Backend is unreachable")?;
        let login: LoginResponse = Self::expect_success(response, "login")?.json().await?;
        Ok(login.access_token)
    }

    pub async fn all_presets(&self, token: &str) -> Result<Vec<RemotePreset>> {
        let response = self
            .request(
                Method::GET,
                "rest/v1/game_settings?select=*&order=id.desc",
                Some(token),
            )
            .send()
            .await
            .context("Backend is unreachable")?;
        Ok(Self::expect_success(response, "presets")?
            .json()
            .await?)
    }

    pub async fn set_preset_status(&self, token: &str, id: i64, status: &str) -> Result<()> {
        let response = self
            .request(
                Method::PATCH,
                &format!("rest/v1/game_settings?id=eq.{id}"),
                Some(token),
            )
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "preset moderation")?;
        Ok(())
    }

    pub async fn delete_preset(&self, token: &str, id: i64) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &format!("rest/v1/game_settings?id=eq.{id}"),
                Some(token),
            )
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "preset deletion")?;
        Ok(())
    }

    pub async fn create_repository(&self, token: &str, repo: &RemoteRepo) -> Result<()> {
        let response = self
            .request(Method::POST, "rest/v1/repositories", Some(token))
            .json(repo)
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "repository creation")?;
        Ok(())
    }

    pub async fn update_repository(&self, token: &str, id: i64, repo: &RemoteRepo) -> Result<()> {
        let response = self
            .request(
                Method::PATCH,
                &format!("rest/v1/repositories?id=eq.{id}"),
                Some(token),
            )
            .json(repo)
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "repository update")?;
        Ok(())
    }

    pub async fn delete_repository(&self, token: &str, id: i64) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &format!("rest/v1/repositories?id=eq.{id}"),
                Some(token),
            )
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "repository deletion")?;
        Ok(())
    }

    pub async fn create_category(&self, token: &str, name: &str) -> Result<()> {
        let response = self
            .request(Method::POST, "rest/v1/categories", Some(token))
            .json(&Category {
                id: None,
                name: name.to_string(),
            })
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "category creation")?;
        Ok(())
    }

    pub async fn delete_category(&self, token: &str, id: i64) -> Result<()> {
        let response = self
            .request(
                Method::DELETE,
                &format!("rest/v1/categories?id=eq.{id}"),
                Some(token),
            )
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "category deletion")?;
        Ok(())
    }

    pub async fn update_app_config(&self, token: &str, config: &AppConfig) -> Result<()> {
        let response = self
            .request(Method::PATCH, "rest/v1/app_config?id=eq.1", Some(token))
            .json(config)
            .send()
            .await
            .context("Backend is unreachable")?;
        Self::expect_success(response, "app config update")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults_for_missing_fields() {
        let json = r#"{
            "dialog_title": "Welcome",
            "dialog_message": "New builds are up.",
            "show_dialog": true
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.show_dialog);
        assert!(!config.is_update);
        assert_eq!(config.update_url, "");
        assert_eq!(config.latest_version, 1);
    }

    #[test]
    fn test_remote_preset_row_deserializes_sparsely() {
        let json = r#"{
            "id": 42,
            "name": "GTA San Andreas",
            "device": "Poco F5",
            "winlator_repo_owner": "brunodev85",
            "winlator_repo_name": "winlator",
            "status": "approved"
        }"#;
        let preset: RemotePreset = serde_json::from_str(json).unwrap();
        assert_eq!(preset.id, Some(42));
        assert_eq!(preset.status, "approved");
        assert_eq!(preset.audio_driver, "alsa");
        assert_eq!(preset.graphics, "");
    }

    #[test]
    fn test_submission_is_forced_to_pending_without_id() {
        let preset = RemotePreset {
            id: Some(9),
            name: "Test".to_string(),
            status: "approved".to_string(),
            ..RemotePreset::default()
        };
        let submission = RemotePreset {
            id: None,
            status: default_status(),
            ..preset.clone()
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["status"], "pending");
        assert!(value.get("id").is_none());
        assert_eq!(value["name"], "Test");
    }
}
