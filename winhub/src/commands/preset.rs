use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use winhub_lib::backend::BackendClient;
use winhub_lib::presets::{Preset, PresetStore, validate_for_submission};
use winhub_lib::settings::Settings;

#[derive(Args)]
pub struct PresetCommand {
    #[command(subcommand)]
    pub action: PresetAction,
}

#[derive(Subcommand)]
pub enum PresetAction {
    /// List locally saved presets
    #[command(alias = "ls")]
    List,

    /// Show one preset in full
    Show(ShowArgs),

    /// Save a game-setting preset locally
    Save(SaveArgs),

    /// Delete a local preset
    Delete(ShowArgs),

    /// Browse approved community presets
    Community(CommunityArgs),

    /// Copy a community preset into the local store
    Import(ImportArgs),

    /// Submit a local preset to the community moderation queue
    Submit(SubmitArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Preset id or name
    pub preset: String,
}

#[derive(Args)]
pub struct SaveArgs {
    /// Name of the game this preset is for
    pub name: String,

    /// Distribution format, e.g. "Preinstalled"
    #[arg(long)]
    pub format: Option<String>,

    /// Device the preset was tested on
    #[arg(long)]
    pub device: Option<String>,

    /// Gamepad used, if any
    #[arg(long)]
    pub gamepad: Option<String>,

    /// Winlator build: version label shown to other players
    #[arg(long)]
    pub winlator_version: Option<String>,

    /// Winlator build: owner/repo it came from
    #[arg(long)]
    pub winlator_repo: Option<String>,

    /// Winlator build: release tag
    #[arg(long)]
    pub winlator_tag: Option<String>,

    /// Winlator build: asset name
    #[arg(long)]
    pub winlator_asset: Option<String>,

    /// Graphics settings summary
    #[arg(long)]
    pub graphics: Option<String>,

    /// Wine version
    #[arg(long)]
    pub wine: Option<String>,

    /// Box64 version
    #[arg(long)]
    pub box64: Option<String>,

    /// Box64 preset name
    #[arg(long)]
    pub box64_preset: Option<String>,

    /// Screen resolution, e.g. 1280x720
    #[arg(long)]
    pub resolution: Option<String>,

    /// GPU driver
    #[arg(long)]
    pub gpu_driver: Option<String>,

    /// DXVK version
    #[arg(long)]
    pub dxvk: Option<String>,

    /// Audio driver
    #[arg(long)]
    pub audio_driver: Option<String>,
}

#[derive(Args)]
pub struct CommunityArgs {
    /// How many community presets to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Community preset id (see `winhub preset community`)
    pub id: i64,
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Local preset id or name
    pub preset: String,

    /// Link to a gameplay video backing the preset
    #[arg(long)]
    pub youtube_url: Option<String>,
}

impl PresetCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config()?;
        let settings = Settings::load(&config)?;
        let store = PresetStore::new(&config);

        match self.action {
            PresetAction::List => {
                let presets = store.list()?;
                if presets.is_empty() {
                    ui::info("No presets saved yet.");
                    ui::tip("Use `winhub preset save <name> ...` to keep a working setup.");
                    return Ok(());
                }
                ui::heading("Saved presets:");
                for preset in &presets {
                    ui::info(&format!(
                        "{} {} {}",
                        preset.name.bold(),
                        preset.device.dimmed(),
                        preset.id.dimmed()
                    ));
                }
                Ok(())
            }

            PresetAction::Show(args) => {
                let preset = store.find(&args.preset)?;
                print_preset(&preset);
                Ok(())
            }

            PresetAction::Save(args) => {
                let mut preset = Preset {
                    name: args.name,
                    ..Preset::default()
                };
                if let Some(slug) = args.winlator_repo {
                    match slug.split_once('/') {
                        Some((owner, repo)) => {
                            preset.winlator_repo_owner = owner.to_string();
                            preset.winlator_repo_name = repo.to_string();
                        }
                        None => preset.winlator_repo_owner = slug,
                    }
                }
                set_if_given(&mut preset.format, args.format);
                set_if_given(&mut preset.device, args.device);
                set_if_given(&mut preset.gamepad, args.gamepad);
                set_if_given(&mut preset.winlator_version, args.winlator_version);
                set_if_given(&mut preset.winlator_tag_name, args.winlator_tag);
                set_if_given(&mut preset.winlator_asset_name, args.winlator_asset);
                set_if_given(&mut preset.graphics, args.graphics);
                set_if_given(&mut preset.wine, args.wine);
                set_if_given(&mut preset.box64, args.box64);
                set_if_given(&mut preset.box64_preset, args.box64_preset);
                set_if_given(&mut preset.resolution, args.resolution);
                set_if_given(&mut preset.gpu_driver, args.gpu_driver);
                set_if_given(&mut preset.dxvk, args.dxvk);
                set_if_given(&mut preset.audio_driver, args.audio_driver);
                store.save(&preset)?;
                ui::success(&format!("Saved preset '{}' ({})", preset.name, preset.id));
                Ok(())
            }

            PresetAction::Delete(args) => {
                let removed = store.remove(&args.preset)?;
                ui::success(&format!("Deleted preset '{}'", removed.name));
                Ok(())
            }

            PresetAction::Community(args) => {
                let backend = BackendClient::hosted();
                let presets = backend.approved_presets().await?;
                if presets.is_empty() {
                    ui::info("No community presets yet.");
                    return Ok(());
                }
                ui::heading("Community presets:");
                for preset in presets.iter().take(args.limit) {
                    let id = preset.id.map(|id| id.to_string()).unwrap_or_default();
                    ui::info(&format!(
                        "{} {} {} {}",
                        format!("#{id}").bold(),
                        preset.name,
                        preset.device.dimmed(),
                        preset.winlator_version.dimmed()
                    ));
                }
                ui::tip("Use `winhub preset import <id>` to keep one locally.");
                Ok(())
            }

            PresetAction::Import(args) => {
                let backend = BackendClient::hosted();
                let presets = backend.approved_presets().await?;
                let Some(remote) = presets.iter().find(|p| p.id == Some(args.id)) else {
                    anyhow::bail!("No approved community preset #{}", args.id);
                };
                let preset = Preset::from_remote(remote);
                store.save(&preset)?;
                ui::success(&format!("Imported '{}' as {}", preset.name, preset.id));
                Ok(())
            }

            PresetAction::Submit(args) => {
                let preset = store.find(&args.preset)?;
                validate_for_submission(&preset)?;
                let submission = preset.to_submission(
                    &settings.user_id,
                    args.youtube_url.as_deref().unwrap_or(""),
                );
                BackendClient::hosted().submit_preset(&submission).await?;
                ui::success(&format!(
                    "Submitted '{}' for moderation. It shows up once approved.",
                    preset.name
                ));
                Ok(())
            }
        }
    }
}

fn set_if_given(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn print_preset(preset: &Preset) {
    ui::heading(&preset.name);
    let winlator_repo = if preset.winlator_repo_owner.is_empty() {
        String::new()
    } else {
        format!("{}/{}", preset.winlator_repo_owner, preset.winlator_repo_name)
    };
    let rows = [
        ("id", preset.id.as_str()),
        ("format", preset.format.as_str()),
        ("device", preset.device.as_str()),
        ("gamepad", preset.gamepad.as_str()),
        ("winlator version", preset.winlator_version.as_str()),
        ("winlator repo", winlator_repo.as_str()),
        ("winlator tag", preset.winlator_tag_name.as_str()),
        ("winlator asset", preset.winlator_asset_name.as_str()),
        ("graphics", preset.graphics.as_str()),
        ("wine", preset.wine.as_str()),
        ("box64", preset.box64.as_str()),
        ("box64 preset", preset.box64_preset.as_str()),
        ("resolution", preset.resolution.as_str()),
        ("gpu driver", preset.gpu_driver.as_str()),
        ("dxvk", preset.dxvk.as_str()),
        ("audio driver", preset.audio_driver.as_str()),
    ];
    for (label, value) in rows {
        if !value.is_empty() {
            ui::info(&format!("{:>16}: {}", label.dimmed(), value));
        }
    }
}
