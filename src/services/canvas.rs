//! Upload-time canvas normalization.
//!
//! Large images are thumbnailed to fit the canvas; small ones are pasted
//! centered onto a white square. The two branches intentionally produce
//! different output sizes.

use image::{
    DynamicImage, GenericImageView, ImageFormat, ImageResult, Rgb, RgbImage,
    imageops::{self, FilterType},
};
use std::io::Cursor;

use crate::constants::canvas::{BACKGROUND, SIZE};

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// PNG-encoded canvas
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Dimensions of the upload before normalization
    pub original_width: u32,
    pub original_height: u32,
}

/// Decodes an upload and normalizes it onto the fixed canvas.
pub fn normalize(bytes: &[u8]) -> ImageResult<NormalizedImage> {
    let img = image::load_from_memory(bytes)?;
    let (original_width, original_height) = img.dimensions();

    let canvas = normalize_image(&img);
    let (width, height) = canvas.dimensions();

    Ok(NormalizedImage {
        png: encode_png(&canvas)?,
        width,
        height,
        original_width,
        original_height,
    })
}

#[must_use]
pub fn normalize_image(img: &DynamicImage) -> DynamicImage {
    let (w, h) = img.dimensions();

    if w > SIZE || h > SIZE {
        return png_compatible(img.resize(SIZE, SIZE, FilterType::CatmullRom));
    }

    let left = (SIZE - w) / 2;
    let top = (SIZE - h) / 2;

    let mut background = RgbImage::from_pixel(SIZE, SIZE, Rgb(BACKGROUND));
    imageops::replace(
        &mut background,
        &img.to_rgb8(),
        i64::from(left),
        i64::from(top),
    );

    DynamicImage::ImageRgb8(background)
}

/// Encodes losslessly for storage.
pub fn encode_png(img: &DynamicImage) -> ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Collapses exotic pixel formats (16-bit, float) to 8-bit so PNG encoding
/// never fails.
fn png_compatible(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_png(w: u32, h: u32, color: [u8; 3]) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)));
        encode_png(&img).unwrap()
    }

    #[test]
    fn large_image_is_thumbnailed_preserving_aspect() {
        let out = normalize(&solid_png(800, 400, [10, 20, 30])).unwrap();

        assert_eq!((out.original_width, out.original_height), (800, 400));
        assert!(out.width <= SIZE && out.height <= SIZE);
        let ratio = f64::from(out.width) / f64::from(out.height);
        assert!((ratio - 2.0).abs() < 0.02, "ratio {ratio}");

        let decoded = image::load_from_memory(&out.png).unwrap();
        assert_eq!(decoded.dimensions(), (out.width, out.height));
    }

    #[test]
    fn tall_image_fits_longest_side() {
        let out = normalize(&solid_png(300, 1280, [0, 0, 0])).unwrap();
        assert_eq!(out.height, SIZE);
        assert_eq!(out.width, 150);
    }

    #[test]
    fn small_image_is_centered_on_white_canvas() {
        let out = normalize(&solid_png(300, 200, [200, 0, 0])).unwrap();

        assert_eq!((out.width, out.height), (SIZE, SIZE));
        assert_eq!((out.original_width, out.original_height), (300, 200));

        let canvas = image::load_from_memory(&out.png).unwrap().to_rgba8();
        assert_eq!(*canvas.get_pixel(170, 220), Rgba([200, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(469, 419), Rgba([200, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(169, 220), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(170, 219), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(470, 420), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn exact_canvas_size_is_padded_not_resized() {
        let out = normalize(&solid_png(SIZE, SIZE, [1, 2, 3])).unwrap();
        assert_eq!((out.width, out.height), (SIZE, SIZE));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(normalize(b"definitely not an image").is_err());
    }
}
