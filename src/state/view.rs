//! View state: the pan/zoom transform applied to the basemap.

use glam::DVec2;
use std::fmt;

/// Default scale range for the basemap.
pub const DEFAULT_SCALE_EXTENT: (f64, f64) = (1.0, 8.0);

/// Affine pan/zoom transform from map space to screen space.
///
/// A map point `p` lands on screen at `p * k + (x, y)`: the translation is
/// in screen pixels and applied after scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Scale factor
    pub k: f64,
    /// Horizontal translation in screen pixels
    pub x: f64,
    /// Vertical translation in screen pixels
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewTransform {
    pub const fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Maps a map-space point to screen space.
    pub fn apply(&self, point: DVec2) -> DVec2 {
        point * self.k + self.translation()
    }

    /// Maps a screen-space point back to map space.
    pub fn invert(&self, point: DVec2) -> DVec2 {
        (point - self.translation()) / self.k
    }

    pub fn invert_x(&self, x: f64) -> f64 {
        (x - self.x) / self.k
    }

    pub fn invert_y(&self, y: f64) -> f64 {
        (y - self.y) / self.k
    }

    pub fn translation(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Returns a transform with the scale multiplied by `k`.
    pub fn scale_by(&self, k: f64) -> Self {
        Self::new(self.k * k, self.x, self.y)
    }

    /// Returns a transform translated by `(x, y)` in map units.
    pub fn translate_by(&self, x: f64, y: f64) -> Self {
        Self::new(self.k, self.x + self.k * x, self.y + self.k * y)
    }
}

/// Rounds to three decimals for readable log output.
fn approx(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl fmt::Display for ViewTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scale = {} Translate x = {} y = {}",
            approx(self.k),
            approx(self.x),
            approx(self.y)
        )
    }
}

/// The committed view transform.
///
/// Writes clamp the scale into the configured range; the zoom behavior keeps
/// the translation inside the pannable area before an event is emitted.
#[derive(Debug, Clone)]
pub struct ViewState {
    transform: ViewTransform,
    scale_extent: (f64, f64),
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE_EXTENT)
    }
}

impl ViewState {
    pub fn new(scale_extent: (f64, f64)) -> Self {
        Self {
            transform: ViewTransform::identity(),
            scale_extent,
        }
    }

    pub fn current_transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        self.scale_extent
    }

    pub fn set_transform(&mut self, transform: ViewTransform) {
        let (min, max) = self.scale_extent;
        self.transform = ViewTransform {
            k: transform.k.clamp(min, max),
            ..transform
        };
    }
}
