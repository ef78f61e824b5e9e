mod archive;
mod cli;
pub mod config;
mod generator;
mod hosting;
pub mod logging;
pub mod normalize;
mod notification;
mod units;
mod utils;

use std::fs;

use anyhow::Context;
use chrono::Local;
use log::info;

pub use cli::{Cli, LogLevel};
pub use units::Megabytes;

use crate::{config::Config, generator::Generator, notification::Notifier};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting coffee meme generation at {}", Local::now().to_rfc3339());

    let config = Config::load_from(&cli.get_config_path()).context("Failed to load config")?;
    config.validate_for(cli.image.is_none(), !cli.no_send)?;
    info!("Configuration validated successfully");
    let constraint = config.size_constraint()?;
    let ladder = config.quality_ladder()?;

    let raw = match cli.image.as_ref() {
        Some(path) => {
            info!("Using existing image {path:?}");
            fs::read(path).with_context(|| format!("Failed to read image {path:?}"))?
        }
        None => {
            info!("Step 1: Generating coffee meme image...");
            Generator::from_config(&config)?.generate()?
        }
    };
    info!("Image ready: {} bytes", raw.len());

    info!("Step 2: Processing image for delivery...");
    let processed = normalize::normalize_with(&raw, constraint, ladder)
        .context("Failed to process image")?;

    info!("Step 3: Saving image to local directory...");
    archive::save_meme(&config.output_dir, &processed.bytes, Local::now())?;

    if cli.no_send {
        info!("Delivery skipped (--no-send)");
        return Ok(());
    }
    let notifier = Notifier::from_config(&config)?;
    info!("Step 4: Sending image via {}...", notifier.name());
    notifier.send(&processed.bytes)?;
    info!("SUCCESS: Coffee meme sent successfully via {}!", notifier.name());
    Ok(())
}
