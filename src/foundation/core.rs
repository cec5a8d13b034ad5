use crate::foundation::error::{OnionError, OnionResult};

pub use kurbo::{BezPath, Point};

/// Millisecond-resolution key of a keyframe on the video timeline.
///
/// Keys carry the 3-decimal precision used for every resolved annotation time, so two times that
/// print identically always compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeKey(pub u64);

impl TimeKey {
    /// Round `secs` to the nearest millisecond. Negative and NaN inputs map to `0`.
    pub fn from_secs(secs: f64) -> Self {
        if secs.is_nan() || secs <= 0.0 {
            return Self(0);
        }
        Self((secs * 1000.0).round() as u64)
    }

    /// Key time in seconds.
    pub fn as_secs(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Absolute distance between two keys in milliseconds.
    pub fn distance_ms(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl std::fmt::Display for TimeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.as_secs())
    }
}

/// A position normalized to `[0,1]×[0,1]` relative to the viewing surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormPoint {
    /// Horizontal position, 0 = left edge.
    pub x: f64,
    /// Vertical position, 0 = top edge.
    pub y: f64,
}

impl NormPoint {
    /// Build a point, clamping both coordinates into `[0,1]`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: crate::foundation::math::clamp01(x),
            y: crate::foundation::math::clamp01(y),
        }
    }

    /// Normalize a surface-space pixel position against `canvas`.
    pub fn from_pixels(px: Point, canvas: Canvas) -> Self {
        let w = f64::from(canvas.width.max(1));
        let h = f64::from(canvas.height.max(1));
        Self::new(px.x / w, px.y / h)
    }

    /// Map into pixel space of `canvas`.
    pub fn to_pixels(self, canvas: Canvas) -> Point {
        Point::new(
            self.x * f64::from(canvas.width),
            self.y * f64::from(canvas.height),
        )
    }

    /// Squared euclidean distance in normalized units.
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Overlay surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> OnionResult<Self> {
        if width == 0 || height == 0 {
            return Err(OnionError::validation("Canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white; the neutral color of the active keyframe.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque black; used for stroke cores and point outlines.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    /// Build a color from straight channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Scale alpha by `opacity` (clamped to `[0,1]`).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let o = opacity.clamp(0.0, 1.0);
        Self {
            a: (f32::from(self.a) * o).round() as u8,
            ..self
        }
    }

    /// Lowercase `#rrggbb` form (alpha omitted when opaque).
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
