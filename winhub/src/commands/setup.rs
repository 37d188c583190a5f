use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::Result;
use clap::Args;
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct SetupCommand {
    /// Subfolder inside the Downloads directory where files are stored
    #[arg(long)]
    pub subfolder: Option<String>,
}

impl SetupCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let mut settings = Settings::load(&config)?;

        if let Some(subfolder) = self.subfolder {
            settings.download_subdir = subfolder;
        }
        let first_run = !settings.setup_complete;
        settings.setup_complete = true;
        settings.save(&config)?;

        if first_run {
            ui::success("Setup complete.");
        } else {
            ui::success("Settings updated.");
        }
        ui::info(&format!(
            "Downloads land in: {}",
            config.download_dir(&settings.download_subdir).display()
        ));
        ui::info(&format!("Install id: {}", settings.user_id));
        ui::tip("Run `winhub repos` to see what there is to download.");

        Ok(())
    }
}
