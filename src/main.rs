#![warn(clippy::all)]

//! US Basemap - a zoomable, pannable map of the United States rendered from
//! a TopoJSON document.
//!
//! The nation outline is filled and the boundaries shared by two states are
//! stroked on top. Wheel, drag and double-click gestures pan and zoom the
//! view within fixed bounds.

mod basemap;
mod geo;
mod state;
mod ui;

use basemap::{BasemapTextureCache, DataSource, LoadChannel, MapView};
use eframe::egui;
use state::{AppState, LoadStatus, MapSettings, ViewTransform, ZoomChannel, ZoomEvent};

/// Height reserved for the top bar.
#[cfg(not(target_arch = "wasm32"))]
const TOP_BAR_HEIGHT: f32 = 36.0;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    let settings = MapSettings::load();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([
            settings.width as f32 + 16.0,
            settings.height as f32 + TOP_BAR_HEIGHT + 16.0,
        ]),
        ..Default::default()
    };

    eframe::run_native(
        "US Basemap",
        native_options,
        Box::new(|cc| Ok(Box::new(BasemapApp::new(cc, settings)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("app_canvas")
            .expect("Failed to find app_canvas")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("app_canvas was not a HtmlCanvasElement");

        let mut settings = MapSettings::load();
        if let Some(data) = state::url_state::parse_from_url().data {
            settings.data_source = data;
        }

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(BasemapApp::new(cc, settings)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct BasemapApp {
    state: AppState,

    /// Channel for the one-shot topology load
    load_channel: LoadChannel,

    /// Canvas, view transform and geometry. `None` if the surface could not
    /// be created.
    map_view: Option<MapView>,

    /// Gesture events waiting to be committed
    zoom_channel: ZoomChannel,

    /// Texture holding the latest rendered frame
    texture_cache: BasemapTextureCache,

    /// View from the page URL, applied once the basemap loads
    pending_view: Option<ViewTransform>,

    /// Last time the view was written to the URL
    last_url_push: web_time::Instant,
}

impl BasemapApp {
    /// Creates the app and issues the basemap load.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: MapSettings) -> Self {
        let mut state = AppState::new(settings);

        let map_view = MapView::new(&state.settings);
        if map_view.is_none() {
            let message = format!(
                "invalid canvas size {}x{}",
                state.settings.width, state.settings.height
            );
            log::error!("Cannot create map surface: {}", message);
            state.status_message = format!("Error: {}", message);
            state.load_status = LoadStatus::Failed(message);
        }

        let mut load_channel = LoadChannel::new();
        if map_view.is_some() {
            load_channel.load(
                cc.egui_ctx.clone(),
                DataSource(state.settings.data_source.clone()),
            );
        }

        Self {
            state,
            load_channel,
            map_view,
            zoom_channel: ZoomChannel::new(),
            texture_cache: BasemapTextureCache::new(),
            pending_view: state::url_state::parse_from_url().transform(),
            last_url_push: web_time::Instant::now(),
        }
    }

    fn handle_load_result(&mut self, result: basemap::LoadResult) {
        let Some(map_view) = &mut self.map_view else {
            return;
        };

        match map_view.on_load_result(result) {
            Ok(()) => {
                self.state.load_status = LoadStatus::Loaded;
                self.state.status_message = format!("Loaded {}", self.state.settings.data_source);

                // Restore a shared view through the same bounds as gestures.
                if let (Some(t), Some(zoom)) = (self.pending_view.take(), map_view.zoom()) {
                    let t = zoom.restore(t);
                    log::info!("Restoring view from URL. {}", t);
                    self.zoom_channel.emit(ZoomEvent::TransformChanged(t));
                }
            }
            Err(e) => {
                self.state.status_message = format!("Error: {}", e);
                self.state.load_status = LoadStatus::Failed(e.to_string());
            }
        }
    }
}

impl eframe::App for BasemapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for the completed basemap load
        if let Some(result) = self.load_channel.try_recv() {
            self.handle_load_result(result);
        }

        // Commit queued zoom events in order; each one renders a frame
        if let Some(map_view) = &mut self.map_view {
            while let Some(ZoomEvent::TransformChanged(t)) = self.zoom_channel.try_recv() {
                map_view.commit(t);
                log::debug!("Zoomed. {}", map_view.current_transform());
            }

            // Upload the latest frame if it changed
            let generation = map_view.generation();
            if generation > 0 && !self.texture_cache.is_valid(generation) {
                self.texture_cache
                    .update(ctx, generation, map_view.canvas().to_color_image());
            }

            // Push current view to URL (throttled to once per second)
            if map_view.is_loaded() {
                let now = web_time::Instant::now();
                if now.duration_since(self.last_url_push).as_secs_f64() >= 1.0 {
                    self.last_url_push = now;
                    state::url_state::push_to_url(
                        &self.state.settings.data_source,
                        &map_view.current_transform(),
                    );
                }
            }
        }

        // Top panel must be rendered before CentralPanel
        ui::render_top_bar(ctx, &self.state);
        ui::render_canvas(
            ctx,
            &self.state,
            self.map_view.as_ref(),
            &self.texture_cache,
            &self.zoom_channel,
        );
    }
}
