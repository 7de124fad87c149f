//! The map view: owns the canvas surface, the committed view transform and
//! the loaded geometry, and renders a frame for every committed transform.

use super::canvas::Canvas;
use super::render::{render_frame, RenderStyle};
use super::types::{BasemapGeometry, LoadError, LoadResult};
use crate::state::{MapSettings, ViewState, ViewTransform, ZoomBehavior};

pub struct MapView {
    canvas: Canvas,
    view: ViewState,
    style: RenderStyle,
    geometry: Option<BasemapGeometry>,
    /// Armed once geometry has loaded; gestures are ignored until then.
    zoom: Option<ZoomBehavior>,
    /// Number of frames rendered so far.
    generation: u64,
}

impl MapView {
    /// Creates an empty view with a surface of the configured size.
    ///
    /// Returns `None` if the configured size is zero.
    pub fn new(settings: &MapSettings) -> Option<Self> {
        Some(Self {
            canvas: Canvas::new(settings.width, settings.height)?,
            view: ViewState::new(settings.scale_extent()),
            style: RenderStyle {
                scale_invariant_strokes: settings.scale_invariant_strokes,
                ..Default::default()
            },
            geometry: None,
            zoom: None,
            generation: 0,
        })
    }

    /// Handles the outcome of the geometry load.
    ///
    /// On success the geometry is stored, the zoom behavior is armed over the
    /// canvas extent, and the first frame is drawn. On failure nothing
    /// changes and the error is handed back for display.
    pub fn on_load_result(&mut self, result: LoadResult) -> Result<(), LoadError> {
        match result {
            LoadResult::Success(geometry) => {
                log::info!(
                    "Basemap loaded: {} nation features, {} state boundary lines",
                    geometry.nation.len(),
                    geometry.states.0.len()
                );
                self.geometry = Some(geometry);
                let zoom = ZoomBehavior::new(
                    self.canvas.width() as f64,
                    self.canvas.height() as f64,
                    self.view.scale_extent(),
                );
                log::debug!(
                    "Zoom armed: scale extent {:?}, translate extent {:?}",
                    zoom.scale_extent(),
                    zoom.translate_extent()
                );
                self.zoom = Some(zoom);
                self.render();
                Ok(())
            }
            LoadResult::Error(e) => {
                log::error!("Failed to load basemap: {}", e);
                Err(e)
            }
        }
    }

    /// Commits a transform and renders it.
    pub fn commit(&mut self, transform: ViewTransform) {
        self.view.set_transform(transform);
        self.render();
    }

    fn render(&mut self) {
        debug_assert!(self.geometry.is_some(), "render before geometry loaded");
        let Some(geometry) = &self.geometry else {
            log::warn!("Skipping render: basemap geometry not loaded");
            return;
        };

        render_frame(
            &mut self.canvas,
            &self.view.current_transform(),
            geometry,
            &self.style,
        );
        self.generation += 1;
    }

    pub fn is_loaded(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_transform(&self) -> ViewTransform {
        self.view.current_transform()
    }

    /// The zoom behavior, once armed.
    pub fn zoom(&self) -> Option<&ZoomBehavior> {
        self.zoom.as_ref()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::two_region_json;
    use glam::DVec2;

    fn settings() -> MapSettings {
        MapSettings {
            width: 4,
            height: 2,
            ..Default::default()
        }
    }

    fn loaded_view() -> MapView {
        let bytes = serde_json::to_vec(&two_region_json()).unwrap();
        let geometry = BasemapGeometry::from_slice(&bytes).unwrap();
        let mut view = MapView::new(&settings()).unwrap();
        view.on_load_result(LoadResult::Success(geometry)).unwrap();
        view
    }

    fn alpha(view: &MapView, x: u32, y: u32) -> u8 {
        view.canvas().pixmap().pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn test_failed_load_never_renders() {
        let mut view = MapView::new(&settings()).unwrap();
        let error = LoadError::MissingObject("nation".to_string());

        assert!(view.on_load_result(LoadResult::Error(error)).is_err());
        assert_eq!(view.generation(), 0);
        assert!(!view.is_loaded());
        assert!(view.zoom().is_none());
        assert_eq!(view.current_transform(), ViewTransform::identity());
        assert!(view.canvas().pixmap().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_renders_once_and_arms_zoom() {
        let view = loaded_view();

        assert_eq!(view.generation(), 1);
        let zoom = view.zoom().unwrap();
        assert_eq!(zoom.scale_extent(), (1.0, 8.0));
        assert_eq!(zoom.translate_extent(), [DVec2::ZERO, DVec2::new(4.0, 2.0)]);
        // The 2x1 map fills the top half of the surface.
        assert_eq!(alpha(&view, 0, 0), 255);
        assert_eq!(alpha(&view, 0, 1), 0);
    }

    #[test]
    fn test_each_commit_renders_once_in_order() {
        let mut view = loaded_view();

        view.commit(ViewTransform::new(2.0, 0.0, 0.0));
        assert_eq!(view.generation(), 2);
        // Map now covers 4x2 screen pixels.
        assert_eq!(alpha(&view, 3, 1), 255);

        view.commit(ViewTransform::new(1.0, 2.0, 0.0));
        assert_eq!(view.generation(), 3);
        assert_eq!(view.current_transform(), ViewTransform::new(1.0, 2.0, 0.0));
        assert_eq!(alpha(&view, 0, 0), 0);
        assert_eq!(alpha(&view, 3, 0), 255);
    }

    #[test]
    fn test_commit_clamps_scale() {
        let mut view = loaded_view();
        view.commit(ViewTransform::new(0.5, 0.0, 0.0));
        assert_eq!(view.current_transform().k, 1.0);
    }

    #[test]
    fn test_constrained_unit_scale_aligns_with_surface() {
        let mut view = loaded_view();
        let zoom = view.zoom().unwrap().clone();

        view.commit(zoom.constrain(ViewTransform::new(1.0, 3.0, -1.0)));
        assert_eq!(view.current_transform(), ViewTransform::identity());
        assert_eq!(alpha(&view, 0, 0), 255);
        assert_eq!(alpha(&view, 1, 0), 255);
    }
}
