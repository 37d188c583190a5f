use crate::cli::GlobalArgs;
use crate::commands;
use crate::ui;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct ReposCommand {}

impl ReposCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let settings = Settings::load(&config)?;
        let catalog = commands::load_catalog(&settings).await;

        ui::heading("Winlator repositories:");
        let width = catalog.iter().map(|c| c.id.len()).max().unwrap_or(0);
        for entry in &catalog {
            let category = match &entry.category {
                Some(category) => format!(" [{category}]").cyan(),
                None => "".to_string().normal(),
            };
            ui::info(&format!(
                "{:width$}  {} {}{}",
                entry.id.bold(),
                entry.name,
                entry.slug().dimmed(),
                category,
                width = width,
            ));
            if !entry.description.is_empty() {
                ui::info(&format!("{:width$}  {}", "", entry.description.dimmed(), width = width));
            }
        }

        ui::info("");
        ui::tip("Use `winhub releases <repo>` to list what a repository ships.");
        ui::tip("Use `winhub get <repo> --asset <pattern>` to download a build.");

        Ok(())
    }
}
