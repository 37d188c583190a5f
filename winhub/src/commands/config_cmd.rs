use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current settings
    Get,
    /// Change a setting: download-subdir or repo-url
    Set(SetArgs),
    /// Print where settings and presets are stored
    Path,
}

#[derive(Args)]
pub struct SetArgs {
    /// One of: download-subdir, repo-url
    pub key: String,
    pub value: String,
}

impl ConfigCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let mut settings = Settings::load(&config)?;

        match self.action {
            None | Some(ConfigAction::Get) => {
                ui::info(&format!("download-subdir = {}", settings.download_subdir));
                ui::info(&format!("repo-url        = {}", settings.custom_repo_url));
                ui::info(&format!("install id      = {}", settings.user_id));
                ui::info(&format!(
                    "setup complete  = {}",
                    if settings.setup_complete { "yes" } else { "no" }
                ));
                ui::info("");
                ui::info(&format!(
                    "Downloads: {}",
                    config.download_dir(&settings.download_subdir).display()
                ));
            }

            Some(ConfigAction::Set(args)) => {
                match args.key.as_str() {
                    "download-subdir" => settings.download_subdir = args.value.clone(),
                    "repo-url" => settings.custom_repo_url = args.value.clone(),
                    other => bail!("Unknown setting '{other}'. Use download-subdir or repo-url."),
                }
                settings.save(&config)?;
                ui::success(&format!("{} = {}", args.key, args.value));
            }

            Some(ConfigAction::Path) => {
                ui::info(&format!("Settings: {}", config.settings_path.display()));
                ui::info(&format!("Presets:  {}", config.presets_path.display()));
                ui::info(&format!("Cache:    {}", config.cache_dir.display()));
            }
        }

        Ok(())
    }
}
