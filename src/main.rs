#![deny(missing_docs)]

//! Entry point for the loopscope waveform loop editor.
use std::path::PathBuf;

use eframe::egui;
use loopscope::config::{self, EditorConfig};
use loopscope::logging;
use loopscope::session::{self, SqliteSessionStore};
use loopscope::ui::{EditorApp, MIN_VIEWPORT_SIZE, StartupSource};
use tracing::warn;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = config::load_or_default();
    let logging_options = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    if let Err(err) = logging::init(&logging_options) {
        eprintln!("Logging disabled: {err}");
    }
    let config = loaded.unwrap_or_else(|err| {
        warn!("Using default config: {err}");
        EditorConfig::default()
    });
    let config_path = config::config_path()
        .map_err(|err| warn!("Settings will not be saved: {err}"))
        .ok();
    let sessions = session::session_db_path()
        .and_then(SqliteSessionStore::open)
        .map_err(|err| warn!("Session history unavailable: {err}"))
        .ok();
    let startup = startup_source(std::env::args_os().nth(1).map(PathBuf::from));

    let viewport = egui::ViewportBuilder::default()
        .with_min_inner_size(MIN_VIEWPORT_SIZE)
        .with_inner_size(egui::vec2(1100.0, 520.0))
        .with_drag_and_drop(true);
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Loopscope",
        native_options,
        Box::new(move |_cc| match EditorApp::new(config, config_path, sessions, startup) {
            Ok(app) => Ok(Box::new(app)),
            Err(message) => Ok(Box::new(LaunchError { message })),
        }),
    )?;
    Ok(())
}

fn startup_source(arg: Option<PathBuf>) -> StartupSource {
    arg.map_or(StartupSource::MostRecent, StartupSource::Path)
}

/// Minimal fallback app to display initialization errors.
struct LaunchError {
    message: String,
}

impl eframe::App for LaunchError {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Failed to start");
                ui.label(&self.message);
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_takes_precedence_over_history() {
        assert_eq!(startup_source(None), StartupSource::MostRecent);
        assert_eq!(
            startup_source(Some(PathBuf::from("a.wav"))),
            StartupSource::Path(PathBuf::from("a.wav"))
        );
    }
}
