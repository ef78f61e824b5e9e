use std::{
    fs::{create_dir_all, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Local};
use log::{debug, info};

/// Writes the meme to `base_folder` under a timestamped name and returns its path
pub fn save_meme(
    base_folder: &Path,
    image: &[u8],
    now: DateTime<Local>,
) -> anyhow::Result<PathBuf> {
    create_dir_all(base_folder)
        .with_context(|| format!("Failed to create output directory {base_folder:?}"))?;

    let filename = format!("coffee_meme_{}.jpg", now.format("%Y-%m-%d_%H-%M-%S"));
    let path = base_folder.join(filename);
    debug!("Writing {} bytes to {path:?}", image.len());

    let mut file = File::create(&path).with_context(|| format!("Failed to create {path:?}"))?;
    file.write_all(image)
        .with_context(|| format!("Failed to write image to {path:?}"))?;

    info!("Image saved to: {path:?}");
    Ok(path)
}
