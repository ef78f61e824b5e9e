use thiserror::Error;

/// Failures of the image normalizer
///
/// Exceeding the size budget is not listed here, it is reported through
/// [`super::Normalized::over_budget`] instead.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to decode input image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("invalid size constraint: {0}")]
    InvalidConstraint(String),

    #[error("invalid quality ladder: {0}")]
    InvalidLadder(String),

    #[error("resize failed: {0}")]
    Resize(String),

    #[error("JPEG encode failed at quality {quality}: {source}")]
    Encode {
        quality: u8,
        #[source]
        source: image::ImageError,
    },
}
