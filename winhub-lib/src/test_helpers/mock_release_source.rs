use crate::github::{Asset, Release};
use crate::release_source::ReleaseSource;
use anyhow::Result;

pub struct MockReleaseSource {
    pub releases: Vec<Release>,
}

impl MockReleaseSource {
    /// Two releases, newest first, with a couple of assets each.
    pub fn stocked() -> Self {
        let asset = |name: &str| Asset {
            name: name.to_string(),
            browser_download_url: format!("https://example.com/{name}"),
            size: 1_000,
        };
        Self {
            releases: vec![
                Release {
                    name: "Winlator 10.1".to_string(),
                    tag_name: "v10.1".to_string(),
                    published_at: None,
                    body: String::new(),
                    assets: vec![asset("Winlator_10.1.apk"), asset("Winlator_10.1_glibc.apk")],
                },
                Release {
                    name: "Winlator 10.0".to_string(),
                    tag_name: "v10.0".to_string(),
                    published_at: None,
                    body: String::new(),
                    assets: vec![asset("Winlator_10.0.apk")],
                },
            ],
        }
    }
}

impl ReleaseSource for MockReleaseSource {
    async fn releases(
        &self,
        _owner: &str,
        _repo: &str,
        _force_refresh: bool,
    ) -> Result<Vec<Release>> {
        Ok(self.releases.clone())
    }
}
