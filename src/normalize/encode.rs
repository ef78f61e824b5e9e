use image::{codecs::jpeg::JpegEncoder, RgbImage};

use super::NormalizeError;

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, NormalizeError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|source| NormalizeError::Encode { quality, source })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn jpeg_magic() {
        let img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let data = encode_jpeg(&img, 80).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }
}
