//! UI modules for the basemap viewer.
//!
//! - Top bar: title and load status
//! - Central canvas: the basemap surface and zoom gestures

mod canvas;
mod top_bar;

pub use canvas::render_canvas;
pub use top_bar::render_top_bar;
