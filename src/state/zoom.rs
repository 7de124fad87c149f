//! Zoom behavior: turns wheel, drag and double-click gestures into view
//! transforms that stay inside the configured scale and pan bounds.

use super::view::ViewTransform;
use glam::DVec2;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Wheel sensitivity for pixel-mode scroll deltas.
const WHEEL_DELTA_FACTOR: f64 = 0.002;

/// Events emitted by the gesture handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomEvent {
    TransformChanged(ViewTransform),
}

/// Single-consumer queue of zoom events.
///
/// The canvas pushes one event per gesture; the app drains the queue at the
/// start of each frame so events are committed in the order they occurred.
pub struct ZoomChannel {
    sender: Sender<ZoomEvent>,
    receiver: Receiver<ZoomEvent>,
}

impl Default for ZoomChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoomChannel {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    pub fn emit(&self, event: ZoomEvent) {
        // The receiver lives in the same struct, so send cannot fail.
        let _ = self.sender.send(event);
    }

    /// Non-blocking poll for the next event.
    pub fn try_recv(&self) -> Option<ZoomEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Pan/zoom limits for a fixed-size viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomBehavior {
    scale_extent: (f64, f64),
    /// Area of map space that may be panned over, as `[min, max]`
    translate_extent: [DVec2; 2],
    /// Viewport in screen space, as `[min, max]`
    extent: [DVec2; 2],
}

impl ZoomBehavior {
    /// Zoom over a `width` x `height` viewport whose pannable area is the
    /// viewport itself.
    pub fn new(width: f64, height: f64, scale_extent: (f64, f64)) -> Self {
        let bounds = [DVec2::ZERO, DVec2::new(width, height)];
        Self {
            scale_extent,
            translate_extent: bounds,
            extent: bounds,
        }
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        self.scale_extent
    }

    pub fn translate_extent(&self) -> [DVec2; 2] {
        self.translate_extent
    }

    /// Shifts the transform so the viewport never shows anything outside the
    /// translate extent. When the extent is smaller than the viewport on an
    /// axis, it is centered on that axis instead.
    pub fn constrain(&self, t: ViewTransform) -> ViewTransform {
        let [ext0, ext1] = self.extent;
        let [tex0, tex1] = self.translate_extent;

        let dx0 = t.invert_x(ext0.x) - tex0.x;
        let dx1 = t.invert_x(ext1.x) - tex1.x;
        let dy0 = t.invert_y(ext0.y) - tex0.y;
        let dy1 = t.invert_y(ext1.y) - tex1.y;

        t.translate_by(correction(dx0, dx1), correction(dy0, dy1))
    }

    /// Brings an externally supplied view, such as one read from a shared
    /// URL, inside the scale range and the pannable area.
    pub fn restore(&self, t: ViewTransform) -> ViewTransform {
        let (min, max) = self.scale_extent;
        self.constrain(ViewTransform {
            k: t.k.clamp(min, max),
            ..t
        })
    }

    /// Wheel zoom around `pointer`. `delta_y` follows the DOM convention:
    /// positive scrolls down and zooms out.
    pub fn wheel(&self, t: ViewTransform, delta_y: f64, pointer: DVec2) -> ViewTransform {
        let k = t.k * 2f64.powf(-delta_y * WHEEL_DELTA_FACTOR);
        self.zoom_around(t, k, pointer)
    }

    /// Pans by a screen-space delta.
    pub fn drag(&self, t: ViewTransform, delta: DVec2) -> ViewTransform {
        self.constrain(t.translate_by(delta.x / t.k, delta.y / t.k))
    }

    /// Doubles the scale around `pointer`, or halves it when `zoom_out`.
    pub fn double_click(&self, t: ViewTransform, pointer: DVec2, zoom_out: bool) -> ViewTransform {
        let factor = if zoom_out { 0.5 } else { 2.0 };
        self.zoom_around(t, t.k * factor, pointer)
    }

    /// Scales to `k` keeping the map point under `pointer` fixed on screen,
    /// then constrains.
    fn zoom_around(&self, t: ViewTransform, k: f64, pointer: DVec2) -> ViewTransform {
        let (min, max) = self.scale_extent;
        let k = k.clamp(min, max);
        let anchor = t.invert(pointer);

        let scaled = t.scale_by(k / t.k);
        let screen = scaled.apply(anchor);
        let moved = ViewTransform::new(
            scaled.k,
            scaled.x + pointer.x - screen.x,
            scaled.y + pointer.y - screen.y,
        );
        self.constrain(moved)
    }
}

/// Map-space shift for one axis given how far each viewport edge lies past
/// the matching translate-extent edge.
fn correction(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else {
        let pull = d0.min(0.0);
        if pull != 0.0 {
            pull
        } else {
            d1.max(0.0)
        }
    }
}
