//! Desktop viewer: one track, its waveform, and the recent-session list.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;
use tracing::{info, warn};

use crate::animation::PlaybackAnimation;
use crate::audio::AudioBackend;
use crate::config::{self, EditorConfig};
use crate::interaction::PointerGesture;
use crate::session::{NewSession, SessionPage, SessionStore, SqliteSessionStore};
use crate::track::{Track, TrackSource, TrackStatus};

mod controls;
mod loader;
mod waveform_panel;

use loader::PendingDecode;

/// Smallest window size that keeps the controls usable.
pub const MIN_VIEWPORT_SIZE: egui::Vec2 = egui::vec2(640.0, 360.0);

const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg", "aif", "aiff"];

/// Where the first file comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupSource {
    /// Open this file.
    Path(PathBuf),
    /// Reopen the most recently used session, if any.
    MostRecent,
}

/// The eframe application.
pub struct EditorApp {
    track: Track,
    config: EditorConfig,
    config_path: Option<PathBuf>,
    settings_changed: bool,
    sessions: Option<SqliteSessionStore>,
    recent: SessionPage,
    gesture: PointerGesture,
    was_hovered: bool,
    animation: PlaybackAnimation,
    texture: Option<egui::TextureHandle>,
    pending: Option<PendingDecode>,
    notice: Option<String>,
}

impl EditorApp {
    /// Build the app and start loading the startup file.
    ///
    /// Settings changed in the UI are written to `config_path` on exit.
    pub fn new(
        config: EditorConfig,
        config_path: Option<PathBuf>,
        sessions: Option<SqliteSessionStore>,
        startup: StartupSource,
    ) -> Result<Self, String> {
        let backend = AudioBackend::Device(config.audio_output.clone());
        let track = Track::new(config.track.clone(), backend);
        let mut app = Self {
            track,
            config,
            config_path,
            settings_changed: false,
            sessions,
            recent: SessionPage::default(),
            gesture: PointerGesture::default(),
            was_hovered: false,
            animation: PlaybackAnimation::new(),
            texture: None,
            pending: None,
            notice: None,
        };
        app.refresh_recent();
        match startup {
            StartupSource::Path(path) => {
                let request = read_source(&path)
                    .map_err(|err| format!("Could not read {}: {err}", path.display()))?;
                app.open(request, true);
            }
            StartupSource::MostRecent => {
                if let Some(source) = app.recent.summaries.first().map(|s| s.source.clone()) {
                    app.reopen(&source);
                }
            }
        }
        Ok(app)
    }

    /// Start loading `request`; `remember` stores it as a new session.
    fn open(&mut self, request: TrackSource, remember: bool) {
        self.animation.cancel();
        self.gesture = PointerGesture::default();
        if remember {
            self.remember(&request);
        }
        self.track.clear();
        self.track.set_gain(self.config.track.default_gain);
        self.track.begin_initialize(&request);
        match PendingDecode::spawn(&request) {
            Ok(pending) => {
                self.pending = Some(pending);
                self.notice = None;
            }
            Err(err) => {
                warn!("Failed to start decoder thread: {err}");
                self.notice = Some(format!("Could not start decoding: {err}"));
                self.track.clear();
            }
        }
    }

    fn reopen(&mut self, source: &str) {
        let Some(store) = self.sessions.as_mut() else {
            return;
        };
        match store.get_session(source) {
            Ok(Some(record)) => {
                if let Err(err) = store.update_last_opened_at(source) {
                    warn!("Failed to update session {source}: {err}");
                }
                self.open(record.to_track_source(), false);
                self.refresh_recent();
            }
            Ok(None) => self.notice = Some(format!("Session {source} no longer exists")),
            Err(err) => self.notice = Some(format!("Could not load session: {err}")),
        }
    }

    fn remember(&mut self, request: &TrackSource) {
        let Some(store) = self.sessions.as_mut() else {
            return;
        };
        let session = NewSession {
            source: request.source.clone(),
            display_name: request.display_name.clone(),
            audio_bytes: request.bytes.to_vec(),
        };
        if let Err(err) = store.add_session(session) {
            warn!("Failed to store session {}: {err}", request.source);
        }
        self.refresh_recent();
    }

    fn refresh_recent(&mut self) {
        let Some(store) = self.sessions.as_ref() else {
            return;
        };
        match store.get_session_summaries(self.config.session_page_size, None) {
            Ok(page) => self.recent = page,
            Err(err) => warn!("Failed to list sessions: {err}"),
        }
    }

    fn load_more_recent(&mut self) {
        let (Some(store), Some(cursor)) = (self.sessions.as_ref(), self.recent.next_cursor) else {
            return;
        };
        match store.get_session_summaries(self.config.session_page_size, Some(cursor)) {
            Ok(page) => {
                self.recent.summaries.extend(page.summaries);
                self.recent.next_cursor = page.next_cursor;
                self.recent.total = page.total;
            }
            Err(err) => warn!("Failed to list sessions: {err}"),
        }
    }

    fn pick_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Audio", AUDIO_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        match read_source(&path) {
            Ok(request) => self.open(request, true),
            Err(err) => self.notice = Some(format!("Could not read {}: {err}", path.display())),
        }
    }

    fn poll_decode(&mut self) {
        let Some(result) = self.pending.as_ref().and_then(PendingDecode::poll) else {
            return;
        };
        self.pending = None;
        match self.track.complete_initialize(result) {
            TrackStatus::Initialized => info!("Opened {}", self.track.display_name()),
            TrackStatus::FailedToInitialize => {
                self.notice = self.track.last_error().map(str::to_owned);
            }
            _ => {}
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let Some(file) = ctx.input(|i| i.raw.dropped_files.first().cloned()) else {
            return;
        };
        match dropped_source(&file) {
            Some(Ok(request)) => self.open(request, true),
            Some(Err(err)) => self.notice = Some(format!("Could not read {}: {err}", file.name)),
            None => warn!("Dropped file {} has neither a path nor contents", file.name),
        }
    }

    /// Change the gain and keep it as the default for later files.
    fn set_gain(&mut self, gain: f32) {
        self.track.set_gain(gain);
        self.config.track.default_gain = self.track.gain();
        self.settings_changed = true;
    }

    fn persist_settings(&mut self) {
        if !self.settings_changed {
            return;
        }
        let Some(path) = self.config_path.as_deref() else {
            return;
        };
        match config::save_to_path(&self.config, path) {
            Ok(()) => {
                self.settings_changed = false;
                info!("Saved settings to {}", path.display());
            }
            Err(err) => warn!("Failed to save settings: {err}"),
        }
    }

    fn toggle_playback(&mut self) {
        self.track.toggle_playback();
        if self.track.is_playing() {
            self.animation.start();
        } else {
            self.animation.cancel();
            self.track.draw();
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.track.status() != TrackStatus::Initialized {
            return;
        }
        let (space, z, escape, c, shift) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::Z),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::C),
                i.modifiers.shift,
            )
        });
        if space {
            self.toggle_playback();
        }
        if z && shift {
            self.track.zoom_out_to_loop();
            self.track.draw();
        } else if z {
            self.track.zoom_to_loop();
            self.track.draw();
        }
        if escape {
            self.track.update_locators(
                crate::track::LocatorKind::Loop,
                None::<crate::track::Locator>,
                crate::track::UpdateOptions::default(),
            );
            self.track.draw();
        }
        if c {
            self.track.restore_previous_loop();
            self.track.draw();
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_decode();
        self.handle_dropped_files(ctx);
        self.handle_keys(ctx);
        controls::top_bar(self, ctx);
        controls::readouts(self, ctx);
        controls::recent_sessions(self, ctx);
        egui::CentralPanel::default().show(ctx, |ui| waveform_panel::show(self, ui));
        if self.animation.tick(&mut self.track) || self.pending.is_some() {
            ctx.request_repaint();
        }
    }
}

impl Drop for EditorApp {
    fn drop(&mut self) {
        self.persist_settings();
        self.track.clear();
    }
}

/// Read a file into an initialization request keyed by its canonical path.
fn read_source(path: &Path) -> std::io::Result<TrackSource> {
    let bytes = std::fs::read(path)?;
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let display_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| canonical.display().to_string());
    Ok(TrackSource {
        bytes: Arc::from(bytes),
        display_name,
        source: canonical.display().to_string(),
    })
}

/// Turn a dropped file into a request; browsers and some platforms hand over
/// bytes without a path.
fn dropped_source(file: &egui::DroppedFile) -> Option<std::io::Result<TrackSource>> {
    if let Some(path) = file.path.as_deref() {
        return Some(read_source(path));
    }
    let bytes = file.bytes.clone()?;
    let name = if file.name.is_empty() {
        "Dropped audio".to_string()
    } else {
        file.name.clone()
    };
    Some(Ok(TrackSource {
        bytes,
        display_name: name.clone(),
        source: name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_saving_to(path: PathBuf) -> EditorApp {
        EditorApp::new(EditorConfig::default(), Some(path), None, StartupSource::MostRecent)
            .unwrap()
    }

    #[test]
    fn read_source_keys_by_canonical_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beat.wav");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        let request = read_source(&path).unwrap();
        assert_eq!(request.display_name, "beat.wav");
        assert_eq!(&*request.bytes, &[1, 2, 3]);
        assert_eq!(request.extension(), Some("wav"));
        assert_eq!(PathBuf::from(&request.source), path.canonicalize().unwrap());
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_source(&dir.path().join("nope.wav")).is_err());
    }

    #[test]
    fn changed_gain_is_saved_on_exit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(config::CONFIG_FILE_NAME);
        let mut app = app_saving_to(path.clone());
        app.set_gain(0.3);
        assert_eq!(app.track.gain(), 0.3);
        drop(app);
        let saved = config::load_from(&path).unwrap();
        assert!((saved.track.default_gain - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn untouched_settings_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(config::CONFIG_FILE_NAME);
        drop(app_saving_to(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn dropped_files_prefer_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        std::fs::write(&path, [4u8, 5]).unwrap();
        let by_path = egui::DroppedFile {
            path: Some(path),
            name: "ignored".into(),
            ..Default::default()
        };
        let request = dropped_source(&by_path).unwrap().unwrap();
        assert_eq!(request.display_name, "kick.wav");

        let by_bytes = egui::DroppedFile {
            name: "snare.flac".into(),
            bytes: Some(Arc::from(vec![1u8, 2, 3])),
            ..Default::default()
        };
        let request = dropped_source(&by_bytes).unwrap().unwrap();
        assert_eq!(request.source, "snare.flac");
        assert_eq!(request.extension(), Some("flac"));
        assert_eq!(&*request.bytes, &[1, 2, 3]);

        assert!(dropped_source(&egui::DroppedFile::default()).is_none());
    }
}
