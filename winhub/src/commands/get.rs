use crate::cli::GlobalArgs;
use crate::commands;
use crate::ui;
use anyhow::{Result, bail};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;
use winhub_lib::download::{
    AggregateSnapshot, DownloadManager, DownloadNotifier, DownloadStatus, DownloadTask,
};
use winhub_lib::fetch::plan_downloads;
use winhub_lib::github::GitHubClient;
use winhub_lib::logging::aggregate_bar_style;
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct GetCommand {
    /// Repository: a catalog id (see `winhub repos`) or owner/repo
    pub repo: String,

    /// Release tag to download from (defaults to the newest release)
    #[arg(long, short)]
    pub tag: Option<String>,

    /// Asset name pattern, case-insensitive; repeat for several assets
    #[arg(long = "asset", short)]
    pub assets: Vec<String>,

    /// Refresh the cached release list first
    #[arg(long, short)]
    pub force: bool,
}

impl GetCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let settings = Settings::load(&config)?;
        if !settings.setup_complete {
            ui::tip("First run? `winhub setup` chooses where downloads land.");
        }

        let repo = commands::resolve_repo(&settings, &self.repo).await?;
        let github = GitHubClient::new(&config);
        let (release, planned) = plan_downloads(
            &github,
            &repo.owner,
            &repo.repo,
            self.tag.as_deref(),
            &self.assets,
            self.force,
        )
        .await?;

        if self.assets.is_empty() {
            ui::heading(&format!("{} {}", repo.name, release.tag_name));
            for asset in &release.assets {
                ui::info(&format!(
                    "  {} ({})",
                    asset.name,
                    ui::format_size(asset.size)
                ));
            }
            ui::info("");
            ui::tip("Pass --asset <pattern> to download one of these.");
            return Ok(());
        }

        let download_dir = config.download_dir(&settings.download_subdir);
        let manager = Arc::new(DownloadManager::new());
        let mut tasks: Vec<Arc<DownloadTask>> = Vec::new();
        for plan in &planned {
            let task = manager.add_task(&plan.url, &download_dir.join(&plan.file_name), &plan.title);
            ui::info(&format!(
                "Queued {} ({})",
                plan.file_name,
                ui::format_size(plan.size)
            ));
            task.start();
            tasks.push(task);
        }

        let notifier = Arc::new(DownloadNotifier::new(Arc::clone(&manager)));
        let snapshots = notifier.subscribe();
        let shutdown = CancellationToken::new();
        let notifier_loop = tokio::spawn({
            let notifier = Arc::clone(&notifier);
            let shutdown = shutdown.clone();
            async move { notifier.run(shutdown).await }
        });

        let interrupted = tokio::select! {
            result = drive_downloads(&tasks, snapshots) => {
                result?;
                false
            }
            _ = tokio::signal::ctrl_c() => {
                for task in &tasks {
                    task.pause();
                }
                true
            }
        };

        shutdown.cancel();
        let _ = notifier_loop.await;

        ui::info("");
        let mut failed = 0;
        for task in &tasks {
            match task.current_status() {
                DownloadStatus::Completed => {
                    ui::success(&format!("{} -> {}", task.title(), task.path().display()));
                }
                DownloadStatus::Paused => {
                    ui::warning(&format!(
                        "{} paused at {:.0}%",
                        task.title(),
                        task.current_progress() * 100.0
                    ));
                }
                DownloadStatus::Failed => {
                    failed += 1;
                    ui::error(&format!("{} failed", task.title()));
                }
                _ => {}
            }
        }
        if interrupted {
            ui::tip("Re-run the same command to resume from where the files stopped.");
        }
        if failed > 0 {
            bail!("{failed} download(s) failed");
        }

        Ok(())
    }
}

/// Render the aggregate notification until every task has settled.
#[instrument(skip_all)]
async fn drive_downloads(
    tasks: &[Arc<DownloadTask>],
    mut snapshots: watch::Receiver<AggregateSnapshot>,
) -> Result<()> {
    let span = tracing::Span::current();
    span.pb_set_style(&aggregate_bar_style()?);
    span.pb_set_length(100);

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot.foreground {
            span.pb_set_position((snapshot.progress * 100.0).round() as u64);
            span.pb_set_message(&snapshot.label);
        }
        if !tasks.is_empty() && tasks.iter().all(|t| t.current_status().is_terminal()) {
            break;
        }
        if snapshots.changed().await.is_err() {
            break;
        }
    }

    Ok(())
}
