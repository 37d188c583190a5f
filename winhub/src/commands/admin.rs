use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use winhub_lib::backend::{AppConfig, BackendClient, RemoteRepo};

const TOKEN_ENV: &str = "WINHUB_ADMIN_TOKEN";

#[derive(Args)]
pub struct AdminCommand {
    #[command(subcommand)]
    pub action: AdminAction,

    /// Access token from `winhub admin login`; falls back to WINHUB_ADMIN_TOKEN
    #[arg(long, global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Exchange panel credentials for an access token
    Login(LoginArgs),

    /// List every community preset with its moderation status
    Presets,

    /// Approve a community preset
    Approve(PresetIdArgs),

    /// Reject a community preset
    Reject(PresetIdArgs),

    /// Delete a community preset outright
    Remove(PresetIdArgs),

    /// Add a repository to the hosted catalog
    RepoAdd(RepoAddArgs),

    /// Update a catalog repository's name, coordinates or category
    RepoUpdate(RepoUpdateArgs),

    /// Remove a repository from the hosted catalog
    RepoRemove(IdArgs),

    /// Add a repository category
    CategoryAdd(NameArgs),

    /// Remove a repository category
    CategoryRemove(IdArgs),

    /// Update the startup announcement shown by `winhub status`
    SetDialog(SetDialogArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    pub email: String,
    pub password: String,
}

#[derive(Args)]
pub struct PresetIdArgs {
    /// Community preset id
    pub id: i64,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: i64,
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct RepoAddArgs {
    /// Display name
    pub name: String,

    /// GitHub coordinates as owner/repo
    pub slug: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub category_id: Option<i64>,
}

#[derive(Args)]
pub struct RepoUpdateArgs {
    /// Repository id in the hosted catalog
    pub id: i64,

    /// New display name
    #[arg(long)]
    pub name: String,

    /// New GitHub coordinates as owner/repo
    #[arg(long)]
    pub slug: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub category_id: Option<i64>,
}

#[derive(Args)]
pub struct SetDialogArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub message: String,

    /// Whether the announcement is shown at all
    #[arg(long)]
    pub show: bool,

    /// Announce an update with this download URL
    #[arg(long)]
    pub update_url: Option<String>,

    /// Version code of the announced update
    #[arg(long)]
    pub latest_version: Option<i64>,
}

impl AdminCommand {
    pub async fn run(self, _global_args: GlobalArgs) -> Result<()> {
        let backend = BackendClient::hosted();

        if let AdminAction::Login(args) = &self.action {
            let token = backend.login(&args.email, &args.password).await?;
            ui::success("Logged in.");
            ui::info(&format!("export {TOKEN_ENV}={token}"));
            ui::tip("Export the line above; every admin command reads it.");
            return Ok(());
        }

        let token = self
            .token
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .context("No admin token. Run `winhub admin login <email> <password>` first.")?;

        match self.action {
            AdminAction::Login(_) => unreachable!("handled above"),

            AdminAction::Presets => {
                let presets = backend.all_presets(&token).await?;
                if presets.is_empty() {
                    ui::info("The moderation queue is empty.");
                    return Ok(());
                }
                for preset in &presets {
                    let id = preset.id.map(|id| id.to_string()).unwrap_or_default();
                    let status = match preset.status.as_str() {
                        "approved" => preset.status.green(),
                        "rejected" => preset.status.red(),
                        _ => preset.status.yellow(),
                    };
                    ui::info(&format!(
                        "{} [{}] {} {}",
                        format!("#{id}").bold(),
                        status,
                        preset.name,
                        preset.submitted_by.dimmed()
                    ));
                }
            }

            AdminAction::Approve(args) => {
                backend.set_preset_status(&token, args.id, "approved").await?;
                ui::success(&format!("Preset #{} approved.", args.id));
            }

            AdminAction::Reject(args) => {
                backend.set_preset_status(&token, args.id, "rejected").await?;
                ui::success(&format!("Preset #{} rejected.", args.id));
            }

            AdminAction::Remove(args) => {
                backend.delete_preset(&token, args.id).await?;
                ui::success(&format!("Preset #{} deleted.", args.id));
            }

            AdminAction::RepoAdd(args) => {
                let (owner, repo) = args
                    .slug
                    .split_once('/')
                    .context("Repository coordinates must look like owner/repo")?;
                backend
                    .create_repository(
                        &token,
                        &RemoteRepo {
                            id: None,
                            name: args.name.clone(),
                            owner: owner.to_string(),
                            repo: repo.to_string(),
                            description: args.description.clone(),
                            category_id: args.category_id,
                        },
                    )
                    .await?;
                ui::success(&format!("Repository '{}' added to the catalog.", args.name));
            }

            AdminAction::RepoUpdate(args) => {
                let (owner, repo) = args
                    .slug
                    .split_once('/')
                    .context("Repository coordinates must look like owner/repo")?;
                backend
                    .update_repository(
                        &token,
                        args.id,
                        &RemoteRepo {
                            id: None,
                            name: args.name.clone(),
                            owner: owner.to_string(),
                            repo: repo.to_string(),
                            description: args.description.clone(),
                            category_id: args.category_id,
                        },
                    )
                    .await?;
                ui::success(&format!("Repository #{} updated.", args.id));
            }

            AdminAction::RepoRemove(args) => {
                backend.delete_repository(&token, args.id).await?;
                ui::success(&format!("Repository #{} removed.", args.id));
            }

            AdminAction::CategoryAdd(args) => {
                backend.create_category(&token, &args.name).await?;
                ui::success(&format!("Category '{}' added.", args.name));
            }

            AdminAction::CategoryRemove(args) => {
                backend.delete_category(&token, args.id).await?;
                ui::success(&format!("Category #{} removed.", args.id));
            }

            AdminAction::SetDialog(args) => {
                let is_update = args.update_url.is_some() || args.latest_version.is_some();
                backend
                    .update_app_config(
                        &token,
                        &AppConfig {
                            dialog_title: args.title.clone(),
                            dialog_message: args.message.clone(),
                            show_dialog: args.show,
                            is_update,
                            update_url: args.update_url.clone().unwrap_or_default(),
                            latest_version: args.latest_version.unwrap_or(1),
                        },
                    )
                    .await?;
                ui::success("Startup announcement updated.");
            }
        }

        Ok(())
    }
}
