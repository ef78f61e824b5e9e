use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use coffee_meme::{
    normalize::{normalize, SizeConstraint, DEFAULT_MAX_DIMENSION},
    Megabytes,
};

#[derive(Parser, Clone, PartialEq, Debug)]
#[command(author, version, about)]
/// Converts an image to a JPEG that fits the attachment limits
struct Cli {
    /// Image to read
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the JPEG
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Largest allowed width or height in pixels
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
    max_dimension: u32,

    /// Largest allowed file size
    #[arg(long, default_value_t = 5.0)]
    max_size_mb: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let constraint =
        SizeConstraint::new(cli.max_dimension, Megabytes::from(cli.max_size_mb).as_bytes())?;
    let input = fs::read(&cli.input).with_context(|| format!("Failed to read {:?}", cli.input))?;

    let result = normalize(&input, constraint)?;
    fs::write(&cli.output, &result.bytes)
        .with_context(|| format!("Failed to write {:?}", cli.output))?;

    println!(
        "{}x{} {} bytes quality {} ({} attempts)",
        result.width,
        result.height,
        result.bytes.len(),
        result.quality,
        result.attempts
    );
    if result.over_budget {
        println!(
            "Warning: still larger than {} bytes at the lowest quality",
            constraint.max_bytes()
        );
    }
    Ok(())
}
