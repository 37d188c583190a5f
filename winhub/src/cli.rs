use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use winhub_lib::config::Config;

use crate::commands::admin::AdminCommand;
use crate::commands::config_cmd::ConfigCommand;
use crate::commands::downloads::DownloadsCommand;
use crate::commands::get::GetCommand;
use crate::commands::preset::PresetCommand;
use crate::commands::releases::ReleasesCommand;
use crate::commands::repos::ReposCommand;
use crate::commands::setup::SetupCommand;
use crate::commands::status::StatusCommand;

#[derive(Parser)]
#[command(name = "winhub")]
#[command(about = "Browse Winlator release catalogs, download builds, and share game presets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(clap::Args, Clone)]
pub struct GlobalArgs {
    /// Use a different location for winhub's data: settings, presets and caches (useful for testing)
    #[arg(long, global = true)]
    pub datadir: Option<PathBuf>,

    /// Download into this directory instead of the platform Downloads folder
    #[arg(long, global = true)]
    pub downloads_root: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn config(&self) -> Result<Config> {
        Config::setup(self.datadir.as_deref(), self.downloads_root.as_deref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// First-run setup: choose where downloads land
    Setup(SetupCommand),

    /// Show announcements and whether an update is available
    Status(StatusCommand),

    /// List the known Winlator repositories
    Repos(ReposCommand),

    /// List releases of a repository
    #[command(alias = "ls")]
    Releases(ReleasesCommand),

    /// Download release assets, resuming partial files
    #[command(alias = "download")]
    Get(GetCommand),

    /// Show what is in the downloads folder
    Downloads(DownloadsCommand),

    /// Manage local and community game-setting presets
    Preset(PresetCommand),

    /// Moderation operations for panel administrators
    Admin(AdminCommand),

    /// Read or change settings
    Config(ConfigCommand),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Setup(cmd) => cmd.run(self.global_args).await,
            Commands::Status(cmd) => cmd.run(self.global_args).await,
            Commands::Repos(cmd) => cmd.run(self.global_args).await,
            Commands::Releases(cmd) => cmd.run(self.global_args).await,
            Commands::Get(cmd) => cmd.run(self.global_args).await,
            Commands::Downloads(cmd) => cmd.run(self.global_args).await,
            Commands::Preset(cmd) => cmd.run(self.global_args).await,
            Commands::Admin(cmd) => cmd.run(self.global_args).await,
            Commands::Config(cmd) => cmd.run(self.global_args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use clap::CommandFactory;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }
}
