//! Application state management.
//!
//! The view transform and its zoom limits, the settings the app starts with,
//! and the status shown in the top bar.

mod settings;
pub mod url_state;
mod view;
mod zoom;

pub use settings::MapSettings;
pub use view::{ViewState, ViewTransform};
pub use zoom::{ZoomBehavior, ZoomChannel, ZoomEvent};

/// Progress of the one-shot basemap load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed(String),
}

/// Root application state.
pub struct AppState {
    pub settings: MapSettings,

    pub load_status: LoadStatus,

    /// Application status message displayed in top bar
    pub status_message: String,
}

impl AppState {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            status_message: format!("Loading {}...", settings.data_source),
            settings,
            load_status: LoadStatus::Loading,
        }
    }
}
