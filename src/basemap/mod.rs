//! Basemap loading and rendering.
//!
//! The topology document is loaded once in the background. Once it arrives
//! the map view derives its geometry, arms the zoom behavior and renders a
//! frame onto its canvas for every committed view transform.

mod canvas;
mod loader;
mod map_view;
mod render;
mod texture_cache;
mod types;

pub use loader::LoadChannel;
pub use map_view::MapView;
pub use texture_cache::BasemapTextureCache;
pub use types::{DataSource, LoadResult};
