use crate::github::Release;
use anyhow::Result;

pub trait ReleaseSource {
    fn releases(
        &self,
        owner: &str,
        repo: &str,
        force_refresh: bool,
    ) -> impl Future<Output = Result<Vec<Release>>> + Send;
}
