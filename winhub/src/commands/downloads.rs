use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::Result;
use clap::Args;
use std::fs;
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct DownloadsCommand {}

impl DownloadsCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let settings = Settings::load(&config)?;
        let dir = config.download_dir(&settings.download_subdir);

        ui::info(&format!("Downloads folder: {}", dir.display()));
        if !dir.exists() {
            ui::info("Nothing downloaded yet.");
            return Ok(());
        }

        let mut entries: Vec<(String, u64)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let size = entry.metadata()?.len();
            entries.push((entry.file_name().to_string_lossy().into_owned(), size));
        }

        if entries.is_empty() {
            ui::info("Nothing downloaded yet.");
            return Ok(());
        }

        entries.sort();
        for (name, size) in &entries {
            ui::info(&format!("  {} ({})", name, ui::format_size(*size)));
        }
        ui::tip("Partially downloaded files resume when you `winhub get` them again.");

        Ok(())
    }
}
