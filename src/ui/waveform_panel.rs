use eframe::egui::{self, TextureOptions};

use super::EditorApp;
use crate::interaction;
use crate::track::{CanvasSize, TrackStatus};

pub(super) fn show(app: &mut EditorApp, ui: &mut egui::Ui) {
    let desired = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click_and_drag());
    if app.track.status() != TrackStatus::Initialized {
        app.texture = None;
        app.was_hovered = false;
        return;
    }
    sync_canvas(app, rect);
    handle_pointer(app, ui, rect, &response);
    paint(app, ui, rect);
}

fn sync_canvas(app: &mut EditorApp, rect: egui::Rect) {
    let size = CanvasSize {
        width: rect.width(),
        height: rect.height(),
    };
    if app.track.canvas().is_none() {
        app.track.attach_canvas(size);
    } else {
        app.track.observe_resize(size);
    }
}

fn handle_pointer(app: &mut EditorApp, ui: &egui::Ui, rect: egui::Rect, response: &egui::Response) {
    let width = rect.width().max(1.0);
    let (latest, pressed, released, moving, shift, scroll) = ui.input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.is_moving(),
            i.modifiers.shift,
            i.raw_scroll_delta.y,
        )
    });
    let local = latest.map(|pos| f64::from((pos.x - rect.left()) / width));
    let hovered = response.hovered() || app.gesture.is_dragging();
    let options = app.config.controls.clone();

    if let Some(local) = local {
        if hovered && pressed {
            app.gesture.press(&mut app.track, local, shift);
        } else if app.gesture.is_dragging() && released {
            app.gesture.release(&mut app.track, local);
        } else if hovered && moving && response.contains_pointer() {
            app.gesture.drag(&mut app.track, local, shift, &options);
        } else if app.was_hovered && !response.contains_pointer() {
            app.gesture.leave(&mut app.track, local);
        }
        if response.hovered() && scroll != 0.0 {
            interaction::wheel_zoom(&mut app.track, local, f64::from(-scroll), &options);
        }
    }
    app.was_hovered = response.contains_pointer();
}

fn paint(app: &mut EditorApp, ui: &egui::Ui, rect: egui::Rect) {
    let Some(image) = app.track.canvas_image() else {
        return;
    };
    let texture_id = match app.texture.as_mut() {
        Some(texture) if texture.size() == image.size => {
            texture.set(image.clone(), TextureOptions::LINEAR);
            texture.id()
        }
        _ => {
            let texture = ui
                .ctx()
                .load_texture("waveform_texture", image.clone(), TextureOptions::LINEAR);
            let id = texture.id();
            app.texture = Some(texture);
            id
        }
    };
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    ui.painter()
        .image(texture_id, rect, uv, egui::Color32::WHITE);
}
