use crate::backend::{Category, RemoteRepo};
use anyhow::{Result, bail};
use once_cell::sync::Lazy;

/// One browsable source of Winlator builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRepo {
    /// Short handle used on the command line, e.g. `official`.
    pub id: String,
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub description: String,
    pub category: Option<String>,
}

impl CatalogRepo {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// The distributions every install knows about, even offline.
pub static BUILTIN_REPOS: Lazy<Vec<CatalogRepo>> = Lazy::new(|| {
    [
        ("official", "Winlator Official", "brunodev85", "winlator", "The official Winlator release"),
        ("brasil", "Winlator Brasil", "winlatorbrasil", "Winlator-Brasil", "Community build optimized by the Brazilian community"),
        ("afei", "Winlator Afei", "afeimod", "winlator-mod", "Winlator mod by Afei"),
        ("frost", "Winlator Frost", "MrPhryaNikFrosty", "Winlator-Frost", "Winlator mod by Frost"),
        ("ajay", "Winlator Ajay", "ajay9634", "winlator-ajay", "Winlator mod by Ajay"),
        ("ludashi", "Winlator Ludashi", "Succubussix", "winlator-bionic-glibc", "Bionic glibc build"),
        ("oss", "WinlatorOSS", "Mart-01-oss", "WinlatorOSS", "Winlator open source software build"),
        ("turnip", "Turnip Drivers", "K11MCH1", "WinlatorTurnipDrivers", "Turnip GPU drivers for Winlator"),
    ]
    .into_iter()
    .map(|(id, name, owner, repo, description)| CatalogRepo {
        id: id.to_string(),
        name: name.to_string(),
        owner: owner.to_string(),
        repo: repo.to_string(),
        description: description.to_string(),
        category: None,
    })
    .collect()
});

/// Built-ins plus backend-managed entries, deduplicated by
/// `owner/repo`; a remote entry wins over a built-in with the same
/// coordinates so the backend can rename or recategorize them.
pub fn merged_catalog(
    remote: &[RemoteRepo],
    categories: &[Category],
    custom_repo_url: &str,
) -> Vec<CatalogRepo> {
    let mut catalog: Vec<CatalogRepo> = Vec::new();

    for repo in BUILTIN_REPOS.iter() {
        catalog.push(repo.clone());
    }

    for repo in remote {
        let category = repo.category_id.and_then(|wanted| {
            categories
                .iter()
                .find(|c| c.id == Some(wanted))
                .map(|c| c.name.clone())
        });
        let entry = CatalogRepo {
            id: repo.name.to_lowercase().replace(' ', "-"),
            name: repo.name.clone(),
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            description: repo.description.clone(),
            category,
        };
        if let Some(existing) = catalog.iter_mut().find(|c| c.slug() == entry.slug()) {
            // Keep the stable short handle when the backend renames a
            // built-in entry.
            let id = existing.id.clone();
            *existing = entry;
            existing.id = id;
        } else {
            catalog.push(entry);
        }
    }

    if let Some((owner, repo)) = parse_github_coords(custom_repo_url) {
        let entry = CatalogRepo {
            id: "custom".to_string(),
            name: "Custom repository".to_string(),
            owner,
            repo,
            description: custom_repo_url.to_string(),
            category: None,
        };
        if !catalog.iter().any(|c| c.slug() == entry.slug()) {
            catalog.push(entry);
        }
    }

    catalog
}

/// Resolve a user-supplied handle: a catalog id, an `owner/repo` pair,
/// or a full GitHub URL.
pub fn resolve(catalog: &[CatalogRepo], query: &str) -> Result<CatalogRepo> {
    if let Some(repo) = catalog.iter().find(|c| c.id.eq_ignore_ascii_case(query)) {
        return Ok(repo.clone());
    }
    if let Some(repo) = catalog
        .iter()
        .find(|c| c.slug().eq_ignore_ascii_case(query.trim_end_matches('/')))
    {
        return Ok(repo.clone());
    }

    // Anything shaped like owner/repo is browsable even when it is not
    // in the catalog.
    if let Some((owner, repo)) = parse_github_coords(query) {
        return Ok(CatalogRepo {
            id: format!("{owner}/{repo}"),
            name: format!("{owner}/{repo}"),
            owner,
            repo,
            description: String::new(),
            category: None,
        });
    }

    bail!(
        "Unknown repository '{}'. Run `winhub repos` to list known repositories, or pass owner/repo.",
        query
    );
}

/// Accepts `owner/repo` or `https://github.com/owner/repo[/...]`.
fn parse_github_coords(input: &str) -> Option<(String, String)> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let path = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
        .or_else(|| trimmed.strip_prefix("github.com/"))
        .unwrap_or(trimmed);

    if path.contains("://") {
        return None;
    }

    let mut parts = path.split('/');
    let owner = parts.next()?.trim();
    let repo = parts.next()?.trim();
    if owner.is_empty() || repo.is_empty() || parts.next().is_some() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
