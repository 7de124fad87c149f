//! Frame rendering for the basemap.
//!
//! A frame is a pure function of the geometry and the view transform: the
//! whole surface is cleared and redrawn on every call.

use super::canvas::Canvas;
use super::types::BasemapGeometry;
use crate::state::ViewTransform;
use tiny_skia::{Color, FillRule};

/// Colors and stroke settings for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    /// Fill for the nation outline (#e6e6e6)
    pub nation_fill: Color,
    /// Stroke for the state boundaries (#ffffff)
    pub state_stroke: Color,
    /// Boundary width in map units
    pub line_width: f32,
    /// Divide the line width by the zoom so boundaries keep a constant
    /// on-screen width.
    pub scale_invariant_strokes: bool,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            nation_fill: Color::from_rgba8(0xe6, 0xe6, 0xe6, 0xff),
            state_stroke: Color::WHITE,
            line_width: 1.0,
            scale_invariant_strokes: false,
        }
    }
}

/// Draws one frame of the basemap.
///
/// The canvas state is saved first and restored last, so the call leaves
/// the context exactly as it found it.
pub fn render_frame(
    canvas: &mut Canvas,
    transform: &ViewTransform,
    geometry: &BasemapGeometry,
    style: &RenderStyle,
) {
    let before = (canvas.state(), canvas.save_depth());
    canvas.save();

    canvas.clear_rect(0.0, 0.0, canvas.width() as f32, canvas.height() as f32);

    // Translate in screen space, then scale everything drawn after.
    canvas.translate(transform.x as f32, transform.y as f32);
    canvas.scale(transform.k as f32, transform.k as f32);

    if let Some(path) = geometry.nation_path() {
        canvas.set_fill_color(style.nation_fill);
        canvas.fill_path(path, FillRule::Winding);
    }

    if let Some(path) = geometry.states_path() {
        let line_width = if style.scale_invariant_strokes {
            style.line_width / transform.k as f32
        } else {
            style.line_width
        };
        canvas.set_stroke_color(style.state_stroke);
        canvas.set_line_width(line_width);
        canvas.stroke_path(path);
    }

    canvas.restore();
    debug_assert_eq!((canvas.state(), canvas.save_depth()), before);
}
