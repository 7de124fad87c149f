//! Central canvas UI: the basemap surface and its zoom gestures.

use crate::basemap::{BasemapTextureCache, MapView};
use crate::state::{AppState, LoadStatus, ViewTransform, ZoomChannel, ZoomEvent};
use eframe::egui::{self, Color32, Pos2, Rect, RichText, Sense, Vec2};
use glam::DVec2;

/// Render the canvas and turn input on it into zoom events.
pub fn render_canvas(
    ctx: &egui::Context,
    state: &AppState,
    map_view: Option<&MapView>,
    texture_cache: &BasemapTextureCache,
    zoom_channel: &ZoomChannel,
) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let size = Vec2::new(state.settings.width as f32, state.settings.height as f32);

        // The surface has a fixed size; one point per canvas pixel.
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;

        painter.rect_filled(rect, 0.0, Color32::WHITE);

        if let Some(texture) = texture_cache.texture() {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        draw_status(ui, &rect, &state.load_status);

        if let Some(view) = map_view {
            draw_overlay_info(ui, &rect, &view.current_transform());
            handle_canvas_interaction(&response, &rect, view, zoom_channel);
        }
    });
}

fn draw_overlay_info(ui: &mut egui::Ui, rect: &Rect, transform: &ViewTransform) {
    let overlay_pos = rect.left_top() + Vec2::new(10.0, 10.0);
    let overlay_rect = Rect::from_min_size(overlay_pos, Vec2::new(160.0, 40.0));

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        ui.vertical(|ui| {
            ui.label(
                RichText::new(format!("Scale: {:.3}", transform.k))
                    .monospace()
                    .size(12.0)
                    .color(Color32::from_rgb(90, 90, 110)),
            );
            ui.label(
                RichText::new(format!("Translate: {:.1}, {:.1}", transform.x, transform.y))
                    .monospace()
                    .size(12.0)
                    .color(Color32::from_rgb(90, 90, 110)),
            );
        });
    });
}

fn draw_status(ui: &egui::Ui, rect: &Rect, status: &LoadStatus) {
    let (text, color) = match status {
        LoadStatus::Loading => ("Loading basemap...".to_string(), Color32::GRAY),
        LoadStatus::Loaded => return,
        LoadStatus::Failed(message) => (
            format!("Failed to load basemap: {}", message),
            Color32::from_rgb(200, 60, 60),
        ),
    };

    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(14.0),
        color,
    );
}

/// Emits one `TransformChanged` per gesture. Gestures in the same frame
/// build on each other so none is lost before the queue is drained.
fn handle_canvas_interaction(
    response: &egui::Response,
    rect: &Rect,
    view: &MapView,
    zoom_channel: &ZoomChannel,
) {
    // Input is ignored until the zoom behavior is armed.
    let Some(zoom) = view.zoom() else {
        return;
    };

    let to_canvas = |pos: Pos2| {
        let rel = pos - rect.min;
        DVec2::new(rel.x as f64, rel.y as f64)
    };

    let start = view.current_transform();
    let mut transform = start;

    if response.dragged() {
        let delta = response.drag_delta();
        let next = zoom.drag(transform, DVec2::new(delta.x as f64, delta.y as f64));
        emit_if_changed(zoom_channel, &mut transform, next);
    }

    if response.hovered() {
        let scroll_delta = response.ctx.input(|i| i.raw_scroll_delta);
        if scroll_delta.y != 0.0 {
            if let Some(cursor_pos) = response.hover_pos() {
                // egui reports scrolling up as positive.
                let next = zoom.wheel(transform, -scroll_delta.y as f64, to_canvas(cursor_pos));
                emit_if_changed(zoom_channel, &mut transform, next);
            }
        }
    }

    if response.double_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let shift = response.ctx.input(|i| i.modifiers.shift);
            let next = zoom.double_click(transform, to_canvas(pos), shift);
            emit_if_changed(zoom_channel, &mut transform, next);
        }
    }

    if transform != start {
        response.ctx.request_repaint();
    }
}

fn emit_if_changed(channel: &ZoomChannel, current: &mut ViewTransform, next: ViewTransform) {
    if next != *current {
        *current = next;
        channel.emit(ZoomEvent::TransformChanged(next));
    }
}
