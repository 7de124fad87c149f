//! One-shot topology loading.
//!
//! Uses channel-based communication to bridge the async fetch with egui's
//! synchronous update loop.

use super::types::{BasemapGeometry, DataSource, LoadError, LoadResult};
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Channel-based loader for the basemap topology.
///
/// Loading is async but egui's update() is synchronous. The load task sends
/// exactly one result through the channel and requests a repaint; the UI
/// thread picks it up with `try_recv`.
pub struct LoadChannel {
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    started: bool,
}

impl Default for LoadChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadChannel {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            started: false,
        }
    }

    /// Spawns the load task. Only the first call does anything.
    ///
    /// On native: reads the file on a new thread.
    /// On WASM: fetches the URL with `wasm_bindgen_futures::spawn_local`.
    pub fn load(&mut self, ctx: egui::Context, source: DataSource) {
        if self.started {
            log::warn!("Basemap load already issued, ignoring load of {}", source);
            return;
        }
        self.started = true;
        log::info!("Loading basemap topology from {}", source);

        let sender = self.sender.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::spawn(move || {
                let result = into_load_result(load_native(&source));
                let _ = sender.send(result);
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                let result = into_load_result(load_web(&source).await);
                let _ = sender.send(result);
                ctx.request_repaint();
            });
        }
    }

    /// Non-blocking check for a completed load.
    ///
    /// Returns Some(result) once the load finished, None otherwise.
    pub fn try_recv(&self) -> Option<LoadResult> {
        self.receiver.try_recv().ok()
    }
}

fn into_load_result(result: Result<BasemapGeometry, LoadError>) -> LoadResult {
    match result {
        Ok(geometry) => LoadResult::Success(geometry),
        Err(e) => LoadResult::Error(e),
    }
}

/// Reads and decodes a topology file from disk.
#[cfg(not(target_arch = "wasm32"))]
fn load_native(source: &DataSource) -> Result<BasemapGeometry, LoadError> {
    let bytes = std::fs::read(&source.0).map_err(|error| LoadError::Io {
        source_name: source.to_string(),
        error,
    })?;
    log::info!("Read {} bytes from {}", bytes.len(), source);
    BasemapGeometry::from_slice(&bytes)
}

/// Fetches and decodes a topology document over HTTP.
#[cfg(target_arch = "wasm32")]
async fn load_web(source: &DataSource) -> Result<BasemapGeometry, LoadError> {
    let bytes = fetch_bytes(&source.0).await.map_err(|message| LoadError::Fetch {
        source_name: source.to_string(),
        message,
    })?;
    log::info!("Fetched {} bytes from {}", bytes.len(), source);
    BasemapGeometry::from_slice(&bytes)
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let js_error = |value: wasm_bindgen::JsValue| format!("{:?}", value);

    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;

    let opts = web_sys::RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(web_sys::RequestMode::Cors);
    let request = web_sys::Request::new_with_str_and_init(url, &opts).map_err(js_error)?;

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(format!("HTTP {} {}", response.status(), response.status_text()));
    }

    let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let source = DataSource("/definitely/not/here/us-10m.v1.json".to_string());
        let result = into_load_result(load_native(&source));
        assert!(matches!(result, LoadResult::Error(LoadError::Io { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "basemap-canvas-loader-{}.json",
            std::process::id()
        ));
        let bytes = serde_json::to_vec(&crate::geo::tests::two_region_json()).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let source = DataSource(path.to_string_lossy().into_owned());
        let geometry = load_native(&source).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(geometry.states.0.len(), 1);
    }

    #[test]
    fn test_load_is_issued_once() {
        let ctx = egui::Context::default();
        let mut channel = LoadChannel::new();
        assert!(!channel.started);

        let source = DataSource("/definitely/not/here.json".to_string());
        channel.load(ctx.clone(), source.clone());
        channel.load(ctx, source);
        assert!(channel.started);

        let result = channel.receiver.recv().unwrap();
        assert!(matches!(result, LoadResult::Error(_)));
        // The second call never spawned a task, so nothing else arrives.
        assert!(channel
            .receiver
            .recv_timeout(std::time::Duration::from_millis(200))
            .is_err());
    }
}
