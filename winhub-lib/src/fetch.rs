use crate::github::Release;
use crate::release_source::ReleaseSource;
use anyhow::{Context, Result, anyhow};

/// One asset resolved to a concrete download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDownload {
    pub url: String,
    pub file_name: String,
    pub title: String,
    pub size: u64,
}

/// Resolve asset patterns against a repository's releases.
///
/// Picks the release tagged `tag`, or the newest one, then matches each
/// pattern to exactly one asset. Duplicate patterns collapse onto the
/// same download.
pub async fn plan_downloads<S: ReleaseSource>(
    source: &S,
    owner: &str,
    repo: &str,
    tag: Option<&str>,
    patterns: &[String],
    force_refresh: bool,
) -> Result<(Release, Vec<PlannedDownload>)> {
    let releases = source
        .releases(owner, repo, force_refresh)
        .await
        .with_context(|| format!("Failed to list releases of {owner}/{repo}"))?;

    let release = match tag {
        Some(tag) => releases
            .iter()
            .find(|r| r.tag_name == tag)
            .ok_or_else(|| anyhow!("{owner}/{repo} has no release tagged '{tag}'"))?,
        None => releases
            .first()
            .ok_or_else(|| anyhow!("{owner}/{repo} has no releases"))?,
    };

    let mut planned: Vec<PlannedDownload> = Vec::new();
    for pattern in patterns {
        let asset = release.find_asset(pattern)?;
        if planned.iter().any(|p| p.url == asset.browser_download_url) {
            continue;
        }
        planned.push(PlannedDownload {
            url: asset.browser_download_url.clone(),
            file_name: asset.name.clone(),
            title: asset.name.clone(),
            size: asset.size,
        });
    }

    Ok((release.clone(), planned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::mock_release_source::MockReleaseSource;

    #[tokio::test]
    async fn test_latest_release_is_the_default() {
        let source = MockReleaseSource::stocked();
        let (release, planned) =
            plan_downloads(&source, "o", "r", None, &["glibc".to_string()], false)
                .await
                .unwrap();
        assert_eq!(release.tag_name, "v10.1");
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].file_name, "Winlator_10.1_glibc.apk");
    }

    #[tokio::test]
    async fn test_tag_selects_a_specific_release() {
        let source = MockReleaseSource::stocked();
        let (release, planned) = plan_downloads(
            &source,
            "o",
            "r",
            Some("v10.0"),
            &["10.0".to_string()],
            false,
        )
        .await
        .unwrap();
        assert_eq!(release.tag_name, "v10.0");
        assert_eq!(planned[0].file_name, "Winlator_10.0.apk");
    }

    #[tokio::test]
    async fn test_unknown_tag_is_an_error() {
        let source = MockReleaseSource::stocked();
        let result = plan_downloads(&source, "o", "r", Some("v9.9"), &[], false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_patterns_collapse() {
        let source = MockReleaseSource::stocked();
        let patterns = vec!["glibc".to_string(), "GLIBC".to_string()];
        let (_, planned) = plan_downloads(&source, "o", "r", None, &patterns, false)
            .await
            .unwrap();
        assert_eq!(planned.len(), 1);
    }

    #[tokio::test]
    async fn test_no_releases_is_an_error() {
        let source = MockReleaseSource { releases: vec![] };
        assert!(plan_downloads(&source, "o", "r", None, &[], false).await.is_err());
    }
}
