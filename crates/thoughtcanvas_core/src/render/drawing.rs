//! Freehand drawing surface.
//!
//! # Responsibility
//! - Capture pointer strokes onto a white RGBA bitmap.
//! - Export the bitmap as a PNG data URL when a stroke ends.
//!
//! # Invariants
//! - Strokes use round caps and joins of `brush_size` diameter.
//! - `clear` resets the bitmap to white and drops the pending export.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Cursor;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 400;
pub const DEFAULT_BRUSH_SIZE: u32 = 5;
pub const MIN_BRUSH_SIZE: u32 = 1;
pub const MAX_BRUSH_SIZE: u32 = 20;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DEFAULT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Drawing surface failure.
#[derive(Debug)]
pub enum DrawingError {
    /// Colour is not `#rrggbb`.
    InvalidColor(String),
    Encode(image::ImageError),
}

impl Display for DrawingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColor(value) => write!(f, "invalid colour `{value}`; expected #rrggbb"),
            Self::Encode(err) => write!(f, "failed to encode drawing: {err}"),
        }
    }
}

impl Error for DrawingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidColor(_) => None,
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<image::ImageError> for DrawingError {
    fn from(value: image::ImageError) -> Self {
        Self::Encode(value)
    }
}

/// Bitmap canvas driven by pointer events.
pub struct DrawingCanvas {
    surface: RgbaImage,
    color: Rgba<u8>,
    brush_size: u32,
    cursor: Option<(f32, f32)>,
    pending_export: Option<String>,
}

impl Default for DrawingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingCanvas {
    /// Creates an 800x400 white canvas.
    pub fn new() -> Self {
        Self::with_size(CANVAS_WIDTH, CANVAS_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            surface: RgbaImage::from_pixel(width, height, BACKGROUND),
            color: DEFAULT_COLOR,
            brush_size: DEFAULT_BRUSH_SIZE,
            cursor: None,
            pending_export: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn brush_size(&self) -> u32 {
        self.brush_size
    }

    /// Sets the brush diameter, clamped to 1..=20.
    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    /// Sets the stroke colour from `#rrggbb`.
    pub fn set_color(&mut self, hex: &str) -> Result<(), DrawingError> {
        self.color = parse_hex_color(hex)?;
        Ok(())
    }

    /// Returns whether a stroke is in progress.
    pub fn is_drawing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Begins a path at `(x, y)`.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.cursor = Some((x, y));
    }

    /// Extends the current path to `(x, y)` and strokes the segment.
    ///
    /// Ignored when no stroke is in progress.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(from) = self.cursor else {
            return;
        };
        self.stroke_segment(from, (x, y));
        self.cursor = Some((x, y));
    }

    /// Closes the current path and exports the bitmap.
    ///
    /// Pointer-leave maps to this as well. Nothing is exported when no stroke
    /// was in progress.
    pub fn pointer_up(&mut self) -> Result<(), DrawingError> {
        if self.cursor.take().is_none() {
            return Ok(());
        }
        self.pending_export = Some(self.export_data_url()?);
        Ok(())
    }

    /// Resets to a blank white bitmap and clears the pending export.
    pub fn clear(&mut self) {
        for pixel in self.surface.pixels_mut() {
            *pixel = BACKGROUND;
        }
        self.cursor = None;
        self.pending_export = None;
    }

    /// Data URL exported by the last completed stroke.
    pub fn pending_export(&self) -> Option<&str> {
        self.pending_export.as_deref()
    }

    /// Takes the pending export, leaving none behind.
    pub fn take_export(&mut self) -> Option<String> {
        self.pending_export.take()
    }

    /// Encodes the current bitmap as `data:image/png;base64,…`.
    pub fn export_data_url(&self) -> Result<String, DrawingError> {
        let mut bytes = Vec::new();
        self.surface
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }

    /// RGBA value at `(x, y)`, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.surface.get_pixel_checked(x, y).map(|pixel| pixel.0)
    }

    fn stroke_segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        // Only the part within a brush radius of the bitmap can paint.
        let margin = self.brush_size as f32 / 2.0 + 1.0;
        let lo = (-margin, -margin);
        let hi = (self.width() as f32 + margin, self.height() as f32 + margin);
        let Some((from, to)) = clip_segment(from, to, lo, hi) else {
            return;
        };
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.stamp(from.0 + dx * t, from.1 + dy * t);
        }
    }

    fn stamp(&mut self, cx: f32, cy: f32) {
        let radius = self.brush_size as f32 / 2.0;
        let min_x = (cx - radius).floor().max(0.0) as u32;
        let min_y = (cy - radius).floor().max(0.0) as u32;
        let max_x = ((cx + radius).ceil() as i64).min(i64::from(self.width()) - 1);
        let max_y = ((cy + radius).ceil() as i64).min(i64::from(self.height()) - 1);
        if max_x < 0 || max_y < 0 {
            return;
        }
        for y in min_y..=max_y as u32 {
            for x in min_x..=max_x as u32 {
                let (px, py) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if px * px + py * py <= radius * radius {
                    self.surface.put_pixel(x, y, self.color);
                }
            }
        }
    }
}

/// Clips the segment to the rectangle `lo..=hi` (Liang-Barsky).
///
/// `None` when the segment misses the rectangle or has a non-finite end.
fn clip_segment(
    from: (f32, f32),
    to: (f32, f32),
    lo: (f32, f32),
    hi: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|value| value.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    let edges = [
        (-dx, from.0 - lo.0),
        (dx, hi.0 - from.0),
        (-dy, from.1 - lo.1),
        (dy, hi.1 - from.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((
        (from.0 + dx * t0, from.1 + dy * t0),
        (from.0 + dx * t1, from.1 + dy * t1),
    ))
}

fn parse_hex_color(hex: &str) -> Result<Rgba<u8>, DrawingError> {
    let invalid = || DrawingError::InvalidColor(hex.to_string());
    let digits = hex.trim().strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };
    Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}
