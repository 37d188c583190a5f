use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::Result;
use clap::Args;
use winhub_lib::backend::{APP_VERSION_CODE, BackendClient};

#[derive(Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn run(self, _global_args: GlobalArgs) -> Result<()> {
        let backend = BackendClient::hosted();

        match backend.app_config().await {
            Ok(Some(config)) => {
                if config.show_dialog {
                    ui::heading(&config.dialog_title);
                    ui::info(&config.dialog_message);
                    ui::info("");
                }
                if config.is_update && config.latest_version > APP_VERSION_CODE {
                    ui::warning("A newer winhub build is available.");
                    if !config.update_url.is_empty() {
                        ui::info(&format!("Get it at: {}", config.update_url));
                    }
                } else {
                    ui::success("You are on the latest build.");
                }
            }
            Ok(None) => {
                ui::info("No announcements right now.");
            }
            Err(err) => {
                // Startup announcements are best-effort; a dead backend
                // must not break the tool.
                ui::warning(&format!("Could not fetch announcements: {err}"));
            }
        }

        Ok(())
    }
}
