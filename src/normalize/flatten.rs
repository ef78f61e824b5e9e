use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, info};

/// Produces an opaque RGB8 image
///
/// Images with an alpha channel are composited onto white using alpha as the
/// mask. Palette images are expanded by the decoder so they take the same
/// path when the palette carries transparency.
pub fn flatten_onto_white(img: DynamicImage) -> RgbImage {
    let color = img.color();
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        img if color.has_alpha() => {
            info!("Converting image from {color:?} to RGB on a white background");
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            RgbImage::from_fn(width, height, |x, y| {
                let [r, g, b, a] = rgba.get_pixel(x, y).0;
                Rgb([blend(r, a), blend(g, a), blend(b, a)])
            })
        }
        img => {
            debug!("Converting opaque image from {color:?} to RGB");
            img.to_rgb8()
        }
    }
}

/// `channel` over white, rounded to nearest
fn blend(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, LumaA, Rgba, RgbaImage};
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 255)]
    #[case(0, 255, 0)]
    #[case(200, 255, 200)]
    #[case(0, 128, 127)]
    #[case(255, 77, 255)]
    fn blend_over_white(#[case] channel: u8, #[case] alpha: u8, #[case] expected: u8) {
        assert_eq!(blend(channel, alpha), expected);
    }

    #[test]
    fn transparent_becomes_white() {
        let mut rgba = RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 0]));
        rgba.put_pixel(1, 1, Rgba([0, 0, 255, 255]));

        let actual = flatten_onto_white(DynamicImage::ImageRgba8(rgba));

        assert_eq!(actual.dimensions(), (4, 3));
        assert_eq!(actual.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(actual.get_pixel(1, 1), &Rgb([0, 0, 255]));
    }

    #[test]
    fn gray_alpha_is_flattened() {
        let la = image::ImageBuffer::from_pixel(2, 2, LumaA([0u8, 0]));
        let actual = flatten_onto_white(DynamicImage::ImageLumaA8(la));
        assert_eq!(actual.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    /// 4x4 indexed PNG, left half index 0 (red), right half index 1 (blue)
    fn indexed_png(trns: Option<&[u8]>) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, 4, 4);
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(vec![255, 0, 0, 0, 0, 255]);
            if let Some(trns) = trns {
                encoder.set_trns(trns.to_vec());
            }
            let mut writer = encoder.write_header().unwrap();
            let data: Vec<u8> = (0..16).map(|i| u8::from(i % 4 >= 2)).collect();
            writer.write_image_data(&data).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn transparent_palette_becomes_white() {
        let decoded = image::load_from_memory(&indexed_png(Some(&[0, 255]))).unwrap();
        assert!(decoded.color().has_alpha());

        let actual = flatten_onto_white(decoded);

        assert_eq!(actual.dimensions(), (4, 4));
        assert_eq!(actual.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(actual.get_pixel(3, 3), &Rgb([0, 0, 255]));
    }

    #[test]
    fn opaque_palette_keeps_colors() {
        let decoded = image::load_from_memory(&indexed_png(None)).unwrap();

        let actual = flatten_onto_white(decoded);

        assert_eq!(actual.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(actual.get_pixel(3, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn rgb_passes_through() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let actual = flatten_onto_white(DynamicImage::ImageRgb8(rgb.clone()));
        assert_eq!(actual, rgb);
    }

    #[test]
    fn gray_is_expanded_to_rgb() {
        let gray = GrayImage::from_pixel(2, 2, image::Luma([42]));
        let actual = flatten_onto_white(DynamicImage::ImageLuma8(gray));
        assert_eq!(actual.get_pixel(1, 1), &Rgb([42, 42, 42]));
    }
}
