//! A 2D drawing context over a raster surface.
//!
//! Mirrors the canvas 2D context model: a current state (transform, colors,
//! line width) that drawing calls read, and a save/restore stack so a draw
//! pass can change the state and put it back afterwards.

use eframe::egui::ColorImage;
use tiny_skia::{BlendMode, Color, FillRule, Paint, Path, Pixmap, Rect, Stroke, Transform};

/// Drawing state that `save` and `restore` preserve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextState {
    pub transform: Transform,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f32,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }
}

/// Fixed-size drawing surface with a 2D context.
pub struct Canvas {
    pixmap: Pixmap,
    state: ContextState,
    stack: Vec<ContextState>,
}

impl Canvas {
    /// Creates a transparent canvas. Returns `None` for a zero-sized surface.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            state: ContextState::default(),
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Current drawing state.
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Number of saved states.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Pops the last saved state. Does nothing when nothing was saved.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Appends a translation to the current transform.
    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.state.transform = self.state.transform.pre_translate(tx, ty);
    }

    /// Appends a scale to the current transform.
    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.pre_scale(sx, sy);
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill_color = color;
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke_color = color;
    }

    /// Sets the stroke width. Non-finite or non-positive widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    /// Clears a rectangle (in current user space) to transparent.
    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let Some(rect) = Rect::from_xywh(x, y, width, height) else {
            return;
        };
        let paint = Paint {
            blend_mode: BlendMode::Clear,
            anti_alias: false,
            ..Default::default()
        };
        self.pixmap
            .fill_rect(rect, &paint, self.state.transform, None);
    }

    pub fn fill_path(&mut self, path: &Path, fill_rule: FillRule) {
        let mut paint = Paint::default();
        paint.set_color(self.state.fill_color);
        paint.anti_alias = true;
        self.pixmap
            .fill_path(path, &paint, fill_rule, self.state.transform, None);
    }

    pub fn stroke_path(&mut self, path: &Path) {
        let mut paint = Paint::default();
        paint.set_color(self.state.stroke_color);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: self.state.line_width,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(path, &paint, &stroke, self.state.transform, None);
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Copies the surface into an egui image.
    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_premultiplied(
            [self.width() as usize, self.height() as usize],
            self.pixmap().data(),
        )
    }
}
