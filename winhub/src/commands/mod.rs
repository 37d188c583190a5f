pub mod admin;
pub mod config_cmd;
pub mod downloads;
pub mod get;
pub mod preset;
pub mod releases;
pub mod repos;
pub mod setup;
pub mod status;

use crate::ui;
use anyhow::Result;
use winhub_lib::backend::BackendClient;
use winhub_lib::catalog::{self, CatalogRepo};
use winhub_lib::settings::Settings;

/// Fetch the merged repository catalog. The backend being down only
/// costs the remotely managed entries, never the built-ins.
pub async fn load_catalog(settings: &Settings) -> Vec<CatalogRepo> {
    let backend = BackendClient::hosted();
    match tokio::try_join!(backend.repositories(), backend.categories()) {
        Ok((repos, categories)) => {
            catalog::merged_catalog(&repos, &categories, &settings.custom_repo_url)
        }
        Err(err) => {
            ui::warning(&format!(
                "Backend unavailable ({err}); using the built-in catalog."
            ));
            catalog::merged_catalog(&[], &[], &settings.custom_repo_url)
        }
    }
}

pub async fn resolve_repo(settings: &Settings, query: &str) -> Result<CatalogRepo> {
    let catalog = load_catalog(settings).await;
    catalog::resolve(&catalog, query)
}
