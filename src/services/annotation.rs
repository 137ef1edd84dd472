//! Annotation burn-in: draws the box and its caption into the stored pixels.
//!
//! Burn-in is destructive. Annotating an image twice draws the second box on
//! top of the first one, because the input is always the currently stored
//! payload.

use image::{DynamicImage, ImageResult, Rgba, RgbaImage};
use thiserror::Error;

use super::canvas::encode_png;
use super::label::LabelPainter;
use crate::config::AnnotationConfig;
use crate::constants::annotation::STROKE_COLOR;
use crate::domain::Rect;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Expected four comma-separated coordinates, got {0}")]
    WrongArity(usize),

    #[error("Invalid coordinate: '{0}'")]
    InvalidNumber(String),
}

/// Parses `xywh=pixel:x,y,w,h` (or a bare `x,y,w,h`) into a [`Rect`].
/// Everything before the last `:` is ignored.
pub fn parse_selector(value: &str) -> Result<Rect, SelectorError> {
    let coords = value.rsplit(':').next().unwrap_or(value);
    let parts: Vec<&str> = coords.split(',').map(str::trim).collect();

    let [x, y, w, h] = parts.as_slice() else {
        return Err(SelectorError::WrongArity(parts.len()));
    };

    let parse = |raw: &str| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SelectorError::InvalidNumber(raw.to_string()))
    };

    Ok(Rect::new(parse(x)?, parse(y)?, parse(w)?, parse(h)?))
}

#[derive(Debug, Clone, Copy)]
pub struct BurnInStyle {
    pub stroke_width: u32,
    pub text_margin: u32,
    pub color: Rgba<u8>,
}

impl From<&AnnotationConfig> for BurnInStyle {
    fn from(config: &AnnotationConfig) -> Self {
        Self {
            stroke_width: config.stroke_width,
            text_margin: config.text_margin,
            color: Rgba(STROKE_COLOR),
        }
    }
}

/// Decodes `png`, draws `rect` and centers `label` above it, and returns the
/// re-encoded PNG. The pixel format of the input is preserved.
#[allow(clippy::cast_possible_truncation)]
pub fn burn_in(
    png: &[u8],
    rect: Rect,
    label: &str,
    painter: &dyn LabelPainter,
    style: &BurnInStyle,
) -> ImageResult<Vec<u8>> {
    let decoded = image::load_from_memory(png)?;
    let had_alpha = decoded.color().has_alpha();
    let mut canvas = decoded.to_rgba8();

    draw_rect_outline(&mut canvas, rect, style.stroke_width, style.color);

    let (text_width, text_height) = painter.measure(label);
    let text_x = rect.x + ((rect.w - f64::from(text_width)) / 2.0).floor();
    let text_y = rect.y - f64::from(text_height) - f64::from(style.text_margin);
    painter.paint(
        &mut canvas,
        label,
        text_x as i32,
        text_y as i32,
        style.color,
    );

    let out = if had_alpha {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    };
    encode_png(&out)
}

/// Outline from `(x, y)` to `(x + w, y + h)` inclusive; the stroke grows
/// inward. Coordinates are truncated toward zero.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_rect_outline(canvas: &mut RgbaImage, rect: Rect, stroke_width: u32, color: Rgba<u8>) {
    let (ax, bx) = (rect.x as i64, (rect.x + rect.w) as i64);
    let (ay, by) = (rect.y as i64, (rect.y + rect.h) as i64);
    let (x0, x1) = (ax.min(bx), ax.max(bx));
    let (y0, y1) = (ay.min(by), ay.max(by));

    let max_x = i64::from(canvas.width()) - 1;
    let max_y = i64::from(canvas.height()) - 1;

    for t in 0..i64::from(stroke_width) {
        let (left, right, top, bottom) = (x0 + t, x1 - t, y0 + t, y1 - t);
        if left > right || top > bottom {
            break;
        }

        for x in left.max(0)..=right.min(max_x) {
            put_pixel(canvas, x, top, color);
            put_pixel(canvas, x, bottom, color);
        }
        for y in top.max(0)..=bottom.min(max_y) {
            put_pixel(canvas, left, y, color);
            put_pixel(canvas, right, y, color);
        }
    }
}

fn put_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y))
        && px < canvas.width()
        && py < canvas.height()
    {
        canvas.put_pixel(px, py, color);
    }
}
