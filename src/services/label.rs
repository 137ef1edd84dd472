//! Caption rendering for annotation boxes.
//!
//! [`LabelPainter`] is the seam between the burn-in logic and the font
//! machinery. [`FontLabelPainter`] loads one font file at startup and
//! rasterizes with `cosmic-text`.

use anyhow::{Context, Result};
use cosmic_text::{
    Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, fontdb,
};
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Mutex;

/// Measures and draws single-line text onto an RGBA canvas.
pub trait LabelPainter: Send + Sync {
    /// Rendered `(width, height)` of `text` in pixels.
    fn measure(&self, text: &str) -> (u32, u32);

    /// Draws `text` with its top-left corner at `(x, y)`. Pixels outside the
    /// canvas are skipped.
    fn paint(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, color: Rgba<u8>);
}

struct Rasterizer {
    fonts: FontSystem,
    cache: SwashCache,
}

pub struct FontLabelPainter {
    rasterizer: Mutex<Rasterizer>,
    family: String,
    metrics: Metrics,
}

impl FontLabelPainter {
    /// Loads the font at `path`. Fails if the file is missing or holds no
    /// usable face; there is no fallback font.
    pub fn from_file(path: impl AsRef<Path>, font_size: f32) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;
        Self::from_bytes(data, font_size)
            .with_context(|| format!("Failed to load font: {}", path.display()))
    }

    pub fn from_bytes(data: Vec<u8>, font_size: f32) -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_font_data(data);

        let family = db
            .faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| anyhow::anyhow!("No usable font face found"))?;

        let fonts = FontSystem::new_with_locale_and_db("en-US".to_string(), db);

        Ok(Self {
            rasterizer: Mutex::new(Rasterizer {
                fonts,
                cache: SwashCache::new(),
            }),
            family,
            metrics: Metrics::new(font_size, (font_size * 1.2).ceil()),
        })
    }

    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    fn shape(&self, fonts: &mut FontSystem, text: &str) -> Buffer {
        let mut buffer = Buffer::new(fonts, self.metrics);
        buffer.set_size(fonts, None, None);
        let attrs = Attrs::new().family(Family::Name(&self.family));
        buffer.set_text(fonts, text, &attrs, Shaping::Advanced);
        buffer.shape_until_scroll(fonts, false);
        buffer
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Rasterizer> {
        // A panic mid-draw leaves no invariant behind worth protecting
        self.rasterizer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LabelPainter for FontLabelPainter {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn measure(&self, text: &str) -> (u32, u32) {
        let mut guard = self.lock();
        let buffer = self.shape(&mut guard.fonts, text);

        let (width, lines) = buffer
            .layout_runs()
            .fold((0.0_f32, 0_usize), |(w, n), run| (w.max(run.line_w), n + 1));

        let height = lines as f32 * self.metrics.line_height;
        (width.ceil() as u32, height.ceil() as u32)
    }

    fn paint(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, color: Rgba<u8>) {
        let mut guard = self.lock();
        let Rasterizer { fonts, cache } = &mut *guard;
        let buffer = self.shape(fonts, text);

        let ink = Color::rgba(color[0], color[1], color[2], color[3]);
        buffer.draw(fonts, cache, ink, |gx, gy, w, h, glyph| {
            let coverage = glyph.a();
            if coverage == 0 {
                return;
            }
            for dy in 0..h {
                for dx in 0..w {
                    blend_pixel(
                        canvas,
                        i64::from(x) + i64::from(gx) + i64::from(dx),
                        i64::from(y) + i64::from(gy) + i64::from(dy),
                        [glyph.r(), glyph.g(), glyph.b()],
                        coverage,
                    );
                }
            }
        });
    }
}

/// Alpha-blends `rgb` onto the canvas at `(x, y)`; out-of-bounds is a no-op.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, rgb: [u8; 3], alpha: u8) {
    let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if px >= canvas.width() || py >= canvas.height() {
        return;
    }

    let dst = canvas.get_pixel_mut(px, py);
    let a = u16::from(alpha);
    for c in 0..3 {
        let mixed = (u16::from(rgb[c]) * a + u16::from(dst[c]) * (255 - a)) / 255;
        #[allow(clippy::cast_possible_truncation)]
        {
            dst[c] = mixed as u8;
        }
    }
    dst[3] = dst[3].max(alpha);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    fn system_painter() -> Option<FontLabelPainter> {
        let path = SYSTEM_FONTS.iter().find(|p| Path::new(p).exists())?;
        Some(FontLabelPainter::from_file(path, 20.0).unwrap())
    }

    fn inked(canvas: &RgbaImage) -> usize {
        canvas.pixels().filter(|p| p[0] > 0 || p[1] > 0).count()
    }

    #[test]
    fn font_painter_measures_and_inks_captions() {
        let Some(painter) = system_painter() else {
            eprintln!("skipping: no system font found");
            return;
        };
        assert!(!painter.family().is_empty());

        let (short_w, short_h) = painter.measure("cat");
        let (long_w, long_h) = painter.measure("a considerably longer caption");
        assert!(short_w > 0);
        assert!(long_w > short_w);
        assert_eq!(short_h, long_h);
        assert!(short_h >= 20);
        assert_eq!(painter.measure("").0, 0);

        let mut canvas = RgbaImage::from_pixel(120, 60, Rgba([0, 0, 0, 255]));
        painter.paint(&mut canvas, "cat", 10, 10, Rgba([255, 255, 0, 255]));
        assert!(inked(&canvas) > 0);

        // Ink stays near the measured box; antialiasing may bleed a few pixels
        for (x, y, p) in canvas.enumerate_pixels() {
            if p[0] > 0 {
                assert!((6..=14 + short_w).contains(&x), "x={x}");
                assert!((6..=14 + short_h).contains(&y), "y={y}");
            }
        }
    }

    #[test]
    fn font_painter_clips_out_of_bounds_text() {
        let Some(painter) = system_painter() else {
            eprintln!("skipping: no system font found");
            return;
        };

        let mut canvas = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255]));
        painter.paint(&mut canvas, "clipped caption", -5, -15, Rgba([255, 255, 0, 255]));
        painter.paint(&mut canvas, "far away", 10_000, 10_000, Rgba([255, 255, 0, 255]));
        painter.paint(&mut canvas, "far away", i32::MIN, i32::MAX, Rgba([255, 255, 0, 255]));
        assert_eq!(canvas.dimensions(), (40, 20));
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let err = FontLabelPainter::from_file("/nonexistent/font.ttf", 20.0)
            .err()
            .unwrap();
        assert!(err.to_string().contains("font"));
    }

    #[test]
    fn non_font_bytes_are_rejected() {
        assert!(FontLabelPainter::from_bytes(b"not a font".to_vec(), 20.0).is_err());
    }

    #[test]
    fn blend_pixel_mixes_and_clips() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));

        blend_pixel(&mut canvas, 0, 0, [255, 255, 0], 255);
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 255, 0, 255]));

        blend_pixel(&mut canvas, 1, 1, [255, 255, 255], 0);
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([0, 0, 0, 255]));

        // Outside the canvas in every direction
        blend_pixel(&mut canvas, -1, 0, [255, 0, 0], 255);
        blend_pixel(&mut canvas, 0, 5, [255, 0, 0], 255);
        assert_eq!(*canvas.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }
}
