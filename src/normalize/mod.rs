//! Turns an arbitrary raster image into a JPEG that fits a size budget.
//!
//! Steps: decode, flatten transparency onto white, downscale to the maximum
//! dimension, then walk the [`QualityLadder`] until the encoding fits.

mod constraint;
mod dimensions;
mod encode;
mod error;
mod flatten;
mod resize;

pub use constraint::{
    QualityLadder, SizeConstraint, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY_FLOOR,
    DEFAULT_QUALITY_STEP, DEFAULT_START_QUALITY, MAX_JPEG_DIMENSION,
};
pub use dimensions::fit_within;
pub use encode::encode_jpeg;
pub use error::NormalizeError;
pub use flatten::flatten_onto_white;

use log::{debug, info, warn};

/// Output of [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// JPEG encoded image
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality `bytes` was encoded at
    pub quality: u8,
    /// Number of encodes performed
    pub attempts: usize,
    /// Set when even the floor quality did not fit the byte budget
    pub over_budget: bool,
}

/// Normalizes with the default quality ladder (95 down to 50 in steps of 5)
pub fn normalize(input: &[u8], constraint: SizeConstraint) -> Result<Normalized, NormalizeError> {
    normalize_with(input, constraint, QualityLadder::default())
}

/// Best effort: the only errors are decode failures and codec faults, a
/// missed byte budget is reported through [`Normalized::over_budget`]
pub fn normalize_with(
    input: &[u8],
    constraint: SizeConstraint,
    ladder: QualityLadder,
) -> Result<Normalized, NormalizeError> {
    info!("Normalizing image. Original size: {} bytes", input.len());
    let decoded = image::load_from_memory(input).map_err(NormalizeError::Decode)?;
    debug!(
        "Decoded {}x{} image with color type {:?}",
        decoded.width(),
        decoded.height(),
        decoded.color()
    );

    let mut rgb = flatten_onto_white(decoded);

    let (width, height) = rgb.dimensions();
    if let Some((target_w, target_h)) = fit_within(width, height, constraint.max_dimension()) {
        info!(
            "Resizing image from {width}x{height} to {target_w}x{target_h} to fit {}px limit",
            constraint.max_dimension()
        );
        rgb = resize::resize_rgb(rgb, target_w, target_h)?;
    }

    let mut attempts = 0;
    let mut quality = ladder.start();
    let bytes = loop {
        attempts += 1;
        let encoded = encode_jpeg(&rgb, quality)?;
        if constraint.fits(encoded.len()) {
            break encoded;
        }
        match ladder.next_after(quality) {
            Some(next) => {
                debug!(
                    "Image too large ({} bytes), reducing quality to {next}",
                    encoded.len()
                );
                quality = next;
            }
            None => break encoded,
        }
    };

    let over_budget = !constraint.fits(bytes.len());
    info!(
        "Normalized image size: {} bytes (quality: {quality}, attempts: {attempts})",
        bytes.len()
    );
    if over_budget {
        warn!(
            "Image size ({} bytes) still exceeds limit ({} bytes) at quality floor {}. \
             Some carriers may reject this message.",
            bytes.len(),
            constraint.max_bytes(),
            ladder.floor()
        );
    }

    Ok(Normalized {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
        quality,
        attempts,
        over_budget,
    })
}
