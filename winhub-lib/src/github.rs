use crate::config::Config;
use crate::logging::spinner_style;
use crate::release_source::ReleaseSource;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const CACHE_VALIDITY_HOURS: u64 = 24;
const API_BASE: &str = "https://api.github.com";

/// One release of a distribution, newest first as GitHub returns them.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Release {
    pub name: String,
    pub tag_name: String,
    pub published_at: Option<DateTime<Utc>>,
    pub body: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    pub size: u64,
}

/// Matches the GitHub API JSON response for a single release
#[derive(Debug, Clone, Deserialize)]
struct ReleaseJson {
    name: Option<String>,
    tag_name: String,
    published_at: Option<DateTime<Utc>>,
    body: Option<String>,
    assets: Vec<AssetJson>,
}

/// Matches the GitHub API JSON response for a single release asset
#[derive(Debug, Clone, Deserialize)]
struct AssetJson {
    name: String,
    browser_download_url: String,
    size: u64,
}

impl Release {
    /// Find exactly one asset whose name contains `pattern`
    /// (case-insensitive). Zero or several matches are an error so a
    /// typo never silently downloads the wrong build.
    pub fn find_asset(&self, pattern: &str) -> Result<&Asset> {
        if self.assets.is_empty() {
            bail!("Release {} has no downloadable assets.", self.tag_name);
        }

        let needle = pattern.to_lowercase();
        let matches: Vec<&Asset> = self
            .assets
            .iter()
            .filter(|asset| asset.name.to_lowercase().contains(&needle))
            .collect();

        match matches.as_slice() {
            [] => bail!(
                "No asset of {} matches '{}'. Available: {}",
                self.tag_name,
                pattern,
                self.asset_names().join(", ")
            ),
            [only] => Ok(only),
            many => bail!(
                "'{}' is ambiguous for {}: {}",
                pattern,
                self.tag_name,
                many.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    pub fn asset_names(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.name.clone()).collect()
    }

    fn from_json(json: ReleaseJson) -> Self {
        let name = match json.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => json.tag_name.clone(),
        };
        Release {
            name,
            tag_name: json.tag_name,
            published_at: json.published_at,
            body: json.body.unwrap_or_default(),
            assets: json
                .assets
                .into_iter()
                .map(|a| Asset {
                    name: a.name,
                    browser_download_url: a.browser_download_url,
                    size: a.size,
                })
                .collect(),
        }
    }
}

/// Release-list client over the public GitHub API, with a per-repository
/// JSON file cache so catalog browsing works offline and stays inside
/// the unauthenticated rate limit.
pub struct GitHubClient {
    config: Config,
    client: Client,
}

impl ReleaseSource for GitHubClient {
    async fn releases(&self, owner: &str, repo: &str, force_refresh: bool) -> Result<Vec<Release>> {
        let cache_file = self.cache_file(owner, repo);

        if !force_refresh && is_cache_valid(&cache_file) {
            return load_cache(&cache_file)
                .context("Failed to load the releases cache. Re-run with --force to refresh it.");
        }

        let releases = self.fetch_from_api(owner, repo).await?;
        save_cache(&cache_file, &releases)
            .with_context(|| format!("Failed to save releases cache for {owner}/{repo}"))?;

        Ok(releases)
    }
}

impl GitHubClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(concat!("winhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            config: config.clone(),
            client,
        }
    }

    fn cache_file(&self, owner: &str, repo: &str) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("releases-{owner}-{repo}.json"))
    }

    pub fn cache_age_message(&self, owner: &str, repo: &str) -> String {
        let cache_file = self.cache_file(owner, repo);
        match std::fs::metadata(&cache_file).and_then(|m| m.modified()) {
            Ok(modified) => {
                let modified: DateTime<Utc> = modified.into();
                let hours = Utc::now()
                    .signed_duration_since(modified)
                    .num_hours()
                    .max(0);
                format!(
                    "{} {} {}",
                    "Release cache:".cyan(),
                    "fetched".dimmed(),
                    format!("{hours}h ago").green().bold(),
                )
            }
            Err(_) => format!("{} {}", "Release cache:".cyan(), "empty.".dimmed()),
        }
    }

    #[instrument(skip_all)]
    async fn fetch_from_api(&self, owner: &str, repo: &str) -> Result<Vec<Release>> {
        let current_span = tracing::Span::current();
        current_span.pb_set_style(&spinner_style("{msg}")?);
        current_span.pb_set_message(&format!("Fetching releases of {owner}/{repo}..."));

        let url = format!("{API_BASE}/repos/{owner}/{repo}/releases?per_page=100");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            bail!(
                "GitHub API request for {owner}/{repo} failed: {}",
                response.status()
            );
        }

        let page: Vec<ReleaseJson> = response.json().await?;
        Ok(page.into_iter().map(Release::from_json).collect())
    }
}

/// A cache file is valid if it exists and was modified less than
/// CACHE_VALIDITY_HOURS ago.
fn is_cache_valid(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match std::time::SystemTime::now().duration_since(modified) {
        Ok(age) => age.as_secs() < CACHE_VALIDITY_HOURS * 60 * 60,
        Err(_) => false,
    }
}

fn load_cache(path: &Path) -> Result<Vec<Release>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_cache(path: &Path, releases: &[Release]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(releases)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RELEASE_PAGE: &str = r#"[
        {
            "name": "Winlator 10.1",
            "tag_name": "v10.1",
            "published_at": "2025-03-02T17:40:00Z",
            "body": "Bug fixes.",
            "assets": [
                {
                    "name": "Winlator_10.1.apk",
                    "browser_download_url": "https://example.com/Winlator_10.1.apk",
                    "size": 123456789
                },
                {
                    "name": "Winlator_10.1_glibc.apk",
                    "browser_download_url": "https://example.com/Winlator_10.1_glibc.apk",
                    "size": 123456000
                }
            ]
        },
        {
            "name": null,
            "tag_name": "v10.0",
            "published_at": null,
            "body": null,
            "assets": []
        }
    ]"#;

    fn parse_page() -> Vec<Release> {
        let page: Vec<ReleaseJson> = serde_json::from_str(RELEASE_PAGE).unwrap();
        page.into_iter().map(Release::from_json).collect()
    }

    #[test]
    fn test_release_json_mapping() {
        let releases = parse_page();
        assert_eq!(releases.len(), 2);

        assert_eq!(releases[0].name, "Winlator 10.1");
        assert_eq!(releases[0].assets.len(), 2);
        assert_eq!(releases[0].assets[0].size, 123456789);

        // Missing name falls back to the tag, missing body to "".
        assert_eq!(releases[1].name, "v10.0");
        assert_eq!(releases[1].body, "");
        assert!(releases[1].published_at.is_none());
    }

    #[test]
    fn test_find_asset_single_match() {
        let releases = parse_page();
        let asset = releases[0].find_asset("glibc").unwrap();
        assert_eq!(asset.name, "Winlator_10.1_glibc.apk");
    }

    #[test]
    fn test_find_asset_rejects_ambiguous_pattern() {
        let releases = parse_page();
        assert!(releases[0].find_asset("apk").is_err());
    }

    #[test]
    fn test_find_asset_rejects_unknown_pattern() {
        let releases = parse_page();
        assert!(releases[0].find_asset("arm32").is_err());
        assert!(releases[1].find_asset("anything").is_err());
    }

    #[test]
    fn test_cache_roundtrip() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("cache").join("releases-a-b.json");
        let releases = parse_page();

        assert!(!is_cache_valid(&path));
        save_cache(&path, &releases).unwrap();
        assert!(is_cache_valid(&path));
        assert_eq!(load_cache(&path).unwrap(), releases);
    }
}
