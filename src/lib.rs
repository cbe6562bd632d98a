//! Waveform loop editor core: decoding, zoomable peak rendering and
//! sample-accurate loop playback, plus the desktop viewer built on it.

/// Cursor redraw loop.
pub mod animation;
/// Application directory resolution.
pub mod app_dirs;
/// Decoding, output devices and loop scheduling.
pub mod audio;
/// Persisted editor settings.
pub mod config;
/// Readout formatting.
pub mod format;
/// Pointer gesture translation.
pub mod interaction;
/// Tracing setup and log file rotation.
pub mod logging;
/// Recently opened files.
pub mod session;
/// The track state machine.
pub mod track;
/// The eframe viewer.
pub mod ui;
/// Peak cache and waveform canvas.
pub mod waveform;
