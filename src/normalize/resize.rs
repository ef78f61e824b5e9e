use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;

use super::NormalizeError;

/// Resamples with Lanczos3
pub fn resize_rgb(
    img: RgbImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbImage, NormalizeError> {
    let (width, height) = img.dimensions();
    let src_image = Image::from_vec_u8(width, height, img.into_raw(), PixelType::U8x3)
        .map_err(|e| NormalizeError::Resize(format!("failed to create source image: {e}")))?;
    let mut dst_image = Image::new(target_w, target_h, PixelType::U8x3);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| NormalizeError::Resize(e.to_string()))?;

    RgbImage::from_raw(target_w, target_h, dst_image.into_vec()).ok_or_else(|| {
        NormalizeError::Resize("resized buffer does not match target size".to_string())
    })
}
