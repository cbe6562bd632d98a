use eframe::egui;

use super::EditorApp;
use crate::format::{time_text, zoom_text};
use crate::track::{LocatorKind, TrackStatus};

pub(super) fn top_bar(app: &mut EditorApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                app.pick_file();
            }
            let ready = app.track.status() == TrackStatus::Initialized;
            let label = if app.track.is_playing() { "Pause" } else { "Play" };
            if ui.add_enabled(ready, egui::Button::new(label)).clicked() {
                app.toggle_playback();
            }
            let has_previous = app.track.locators().get(LocatorKind::PrevLoop).is_some()
                || app.track.locators().loop_region().is_some();
            if ui
                .add_enabled(ready && has_previous, egui::Button::new("Cycle loop"))
                .on_hover_text("Turn the loop off or back on (C)")
                .clicked()
            {
                app.track.restore_previous_loop();
                app.track.draw();
            }

            ui.separator();
            let mut gain = app.track.gain();
            if ui
                .add_enabled(ready, egui::Slider::new(&mut gain, 0.0..=1.0).text("Gain"))
                .changed()
            {
                app.set_gain(gain);
            }
            let mut pan = app.track.pan();
            if ui
                .add_enabled(
                    ready && !app.track.is_mono(),
                    egui::Slider::new(&mut pan, -1.0..=1.0).text("Pan"),
                )
                .changed()
            {
                app.track.set_pan(pan);
            }

            ui.separator();
            match app.track.status() {
                TrackStatus::Initializing => {
                    ui.spinner();
                    ui.label(format!("Loading {}", app.track.display_name()));
                }
                TrackStatus::Initialized => {
                    ui.strong(app.track.display_name());
                }
                _ => {}
            }
        });
    });
}

pub(super) fn readouts(app: &mut EditorApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("readouts").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if let Some(notice) = app.notice.as_deref() {
                let color = ui.visuals().warn_fg_color;
                ui.colored_label(color, notice);
                return;
            }
            if app.track.status() != TrackStatus::Initialized {
                return;
            }
            let duration = app.track.duration();
            let region = app.track.locators().loop_region();
            let start = region.map_or(0.0, |r| r.start);
            let end = region.map_or(1.0, |r| r.end_or(1.0));
            ui.monospace(time_text(start * duration));
            ui.monospace(time_text(end * duration));
            if let Some(hover) = app.track.locators().hover() {
                ui.weak(time_text(hover.start * duration));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.monospace(zoom_text(app.track.zoom_state().factor));
            });
        });
    });
}

pub(super) fn recent_sessions(app: &mut EditorApp, ctx: &egui::Context) {
    if app.sessions.is_none() {
        return;
    }
    let mut reopen = None;
    let mut load_more = false;
    egui::SidePanel::left("recent_sessions")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Recent");
            ui.weak(format!("{} sessions", app.recent.total));
            egui::ScrollArea::vertical().show(ui, |ui| {
                for summary in &app.recent.summaries {
                    let selected = summary.source == app.track.source();
                    if ui
                        .selectable_label(selected, summary.display_name.as_str())
                        .on_hover_text(summary.source.as_str())
                        .clicked()
                    {
                        reopen = Some(summary.source.clone());
                    }
                }
                if app.recent.next_cursor.is_some() && ui.button("More").clicked() {
                    load_more = true;
                }
            });
        });
    if let Some(source) = reopen {
        app.reopen(&source);
    }
    if load_more {
        app.load_more_recent();
    }
}
