//! Pixland Control - command-line front end for the Pixland core.

pub mod cli;
pub mod commands;
pub mod logging;

use anyhow::{Context, Result};
use cli::{Cli, Commands, KeyAction, LevelsAction};
use pixland_common::{config, PixlandConfig};

/// Explicit `--config` must exist; the default location may be absent.
pub fn load_config(cli: &Cli) -> Result<PixlandConfig> {
    match &cli.config {
        Some(path) => PixlandConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let path = config::config_path();
            PixlandConfig::load_or_default(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
    }
}

pub async fn run(cli: Cli, config: &PixlandConfig) -> Result<commands::Output> {
    let json = cli.json;
    match cli.command {
        Commands::Key { action } => match action {
            KeyAction::Encode { x, y, max_value } => {
                commands::key_encode(config, x, y, max_value, json)
            }
            KeyAction::Decode { key, max_value } => {
                commands::key_decode(config, key, max_value, json)
            }
            KeyAction::Box {
                left,
                top,
                right,
                bottom,
                max_value,
            } => commands::key_box(config, (left, top), (right, bottom), max_value, json),
        },
        Commands::Level { pixels, since } => commands::level(config, pixels, since, json),
        Commands::Rewards {
            pixels,
            unlocked_only,
        } => commands::rewards(config, pixels, unlocked_only, json),
        Commands::Levels { action } => match action {
            LevelsAction::Show => commands::levels_show(config, json),
            LevelsAction::Check { path } => commands::levels_check(&path, json),
        },
        Commands::Poll {
            job_id,
            max_attempts,
        } => commands::poll(config, &job_id, max_attempts, json).await,
    }
}
