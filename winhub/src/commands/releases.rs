use crate::cli::GlobalArgs;
use crate::commands;
use crate::ui;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use winhub_lib::github::GitHubClient;
use winhub_lib::release_source::ReleaseSource;
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct ReleasesCommand {
    /// Repository: a catalog id (see `winhub repos`) or owner/repo
    pub repo: String,

    /// How many releases to show, newest first
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Refresh the cached release list
    #[arg(long, short)]
    pub force: bool,
}

impl ReleasesCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let settings = Settings::load(&config)?;
        let repo = commands::resolve_repo(&settings, &self.repo).await?;

        let github = GitHubClient::new(&config);
        let releases = github.releases(&repo.owner, &repo.repo, self.force).await?;

        if releases.is_empty() {
            ui::warning(&format!("{} has no releases.", repo.slug()));
            return Ok(());
        }

        ui::heading(&format!("Releases of {} ({}):", repo.name, repo.slug()));
        for release in releases.iter().take(self.limit) {
            let date = release
                .published_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            ui::info(&format!(
                "{} {} {}",
                release.tag_name.bold().green(),
                release.name,
                date.dimmed()
            ));
            for asset in &release.assets {
                ui::info(&format!(
                    "    {} ({})",
                    asset.name,
                    ui::format_size(asset.size)
                ));
            }
        }
        if releases.len() > self.limit {
            ui::info(&format!(
                "... and {} older releases (raise --limit to see them)",
                releases.len() - self.limit
            ));
        }

        ui::info("");
        ui::info(&github.cache_age_message(&repo.owner, &repo.repo));
        ui::tip("Use `winhub get <repo> --asset <pattern>` to download an asset.");

        Ok(())
    }
}
