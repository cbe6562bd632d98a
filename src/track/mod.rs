//! The track: decoded audio, timeline markers, zoom, playback and rendering
//! owned by one explicit context object.
//!
//! A [`Track`] is created when an editor view opens and reset with
//! [`Track::clear`] when it closes. Every mutation goes through its methods;
//! callers sequence `update_locators`/`zoom` before `draw` themselves.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::{
    AudioBackend, AudioBuffer, AudioContext, AudioOutputError, DecodeError, GainControl,
    PlaybackScheduler,
};
use crate::waveform::{RenderStyle, WaveformCanvas};

pub mod coords;
pub mod locators;
pub mod zoom;

mod canvas;
mod editing;
mod lifecycle;
mod playback;

#[cfg(test)]
mod tests;

pub use coords::ZoomWindow;
pub use locators::{Locator, LocatorKind, Locators};
pub use zoom::{DEFAULT_MIN_ZOOM_FACTOR, FactorUpdate, ZoomOutcome, ZoomRequest, ZoomState};

/// Canvas pixels per device-independent pixel.
pub const DEFAULT_RESOLUTION_FACTOR: f32 = 2.0;

/// Initialization progress of a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackStatus {
    /// Nothing loaded.
    #[default]
    Uninitialized,
    /// Decode in progress.
    Initializing,
    /// Audio decoded and output ready.
    Initialized,
    /// Decoding or output setup failed; terminal until cleared.
    FailedToInitialize,
}

/// Why initialization failed.
#[derive(Debug, Error)]
pub enum InitializeError {
    /// The bytes could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// No audio output could be opened.
    #[error("Audio output unavailable: {0}")]
    Output(#[from] AudioOutputError),
}

/// Encoded audio plus its identifying metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackSource {
    /// Encoded file contents.
    pub bytes: Arc<[u8]>,
    /// Title shown to the user.
    pub display_name: String,
    /// Stable key: file name or canonical URL.
    pub source: String,
}

impl TrackSource {
    /// Container hint taken from the source key's extension.
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.source)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

/// Track tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSettings {
    /// Canvas pixels per device-independent pixel.
    pub resolution_factor: f32,
    /// Smallest zoom factor.
    pub min_zoom_factor: f64,
    /// Gain used after initialization and clear.
    pub default_gain: f32,
    /// Waveform colors and bar sizes.
    pub style: RenderStyle,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            resolution_factor: DEFAULT_RESOLUTION_FACTOR,
            min_zoom_factor: DEFAULT_MIN_ZOOM_FACTOR,
            default_gain: 1.0,
            style: RenderStyle::default(),
        }
    }
}

impl TrackSettings {
    /// Clamp values loaded from disk into usable ranges.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.resolution_factor = if self.resolution_factor.is_finite() {
            self.resolution_factor.clamp(0.5, 8.0)
        } else {
            defaults.resolution_factor
        };
        self.min_zoom_factor = if self.min_zoom_factor.is_finite() {
            self.min_zoom_factor.clamp(1e-9, 0.5)
        } else {
            defaults.min_zoom_factor
        };
        self.default_gain = if self.default_gain.is_finite() {
            self.default_gain.clamp(0.0, 1.0)
        } else {
            defaults.default_gain
        };
        self.style.cursor_width = if self.style.cursor_width.is_finite() {
            self.style.cursor_width.clamp(0.5, 16.0)
        } else {
            defaults.style.cursor_width
        };
        self
    }
}

/// Last observed size of the rendering surface in device-independent pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// New value for a locator, absolute or derived from the current one.
pub enum LocatorUpdate {
    /// Use this value.
    Set(Option<Locator>),
    /// Derive the value from the current one.
    Map(Box<dyn FnOnce(Option<Locator>) -> Option<Locator>>),
}

impl LocatorUpdate {
    /// Wrap a closure over the current value.
    pub fn map(update: impl FnOnce(Option<Locator>) -> Option<Locator> + 'static) -> Self {
        Self::Map(Box::new(update))
    }

    fn resolve(self, current: Option<Locator>) -> Option<Locator> {
        match self {
            Self::Set(value) => value,
            Self::Map(update) => update(current),
        }
    }
}

impl From<Option<Locator>> for LocatorUpdate {
    fn from(value: Option<Locator>) -> Self {
        Self::Set(value)
    }
}

impl From<Locator> for LocatorUpdate {
    fn from(value: Locator) -> Self {
        Self::Set(Some(value))
    }
}

/// Options for [`Track::update_locators`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Restart playback with the new loop bounds when playing.
    pub restart_playback: bool,
}

impl UpdateOptions {
    /// Restart playback after a loop change.
    pub const RESTART: Self = Self {
        restart_playback: true,
    };
}

/// Editor state for one loaded file.
pub struct Track {
    settings: TrackSettings,
    backend: AudioBackend,
    status: TrackStatus,
    display_name: String,
    source: String,
    samples: Arc<[f32]>,
    audio_buffer: Option<Arc<AudioBuffer>>,
    audio_context: Option<AudioContext>,
    gain_control: Option<GainControl>,
    scheduler: PlaybackScheduler,
    gain: f32,
    pan: f32,
    locators: Locators,
    zoom_state: ZoomState,
    canvas: Option<WaveformCanvas>,
    canvas_dom_size: Option<CanvasSize>,
    last_error: Option<String>,
}

impl Track {
    /// Empty track that opens its audio output on `backend`.
    pub fn new(settings: TrackSettings, backend: AudioBackend) -> Self {
        let gain = settings.default_gain.clamp(0.0, 1.0);
        Self {
            settings,
            backend,
            status: TrackStatus::Uninitialized,
            display_name: String::new(),
            source: String::new(),
            samples: Arc::from(Vec::new()),
            audio_buffer: None,
            audio_context: None,
            gain_control: None,
            scheduler: PlaybackScheduler::new(),
            gain,
            pan: 0.0,
            locators: Locators::default(),
            zoom_state: ZoomState::default(),
            canvas: None,
            canvas_dom_size: None,
            last_error: None,
        }
    }

    /// Current initialization status.
    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// Title of the loaded file.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Stable key of the loaded file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Mono amplitudes, one per frame; empty unless initialized.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Decoded buffer once initialized.
    pub fn audio_buffer(&self) -> Option<&Arc<AudioBuffer>> {
        self.audio_buffer.as_ref()
    }

    /// Open audio context once initialized.
    pub fn audio_context(&self) -> Option<&AudioContext> {
        self.audio_context.as_ref()
    }

    /// Buffer length in seconds, zero when empty.
    pub fn duration(&self) -> f64 {
        self.audio_buffer.as_ref().map_or(0.0, |buffer| buffer.duration())
    }

    /// True when the buffer has a single channel.
    pub fn is_mono(&self) -> bool {
        self.audio_buffer
            .as_ref()
            .is_some_and(|buffer| buffer.channels() < 2)
    }

    /// Linear gain in `[0, 1]`.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Pan in `[-1, 1]`; always 0 for mono buffers.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// All locators, in normalized space.
    pub fn locators(&self) -> &Locators {
        &self.locators
    }

    /// Zoom factor and history.
    pub fn zoom_state(&self) -> ZoomState {
        self.zoom_state
    }

    /// Visible window.
    pub fn zoom_window(&self) -> ZoomWindow {
        self.zoom_state.window(self.locators.zoom())
    }

    /// Last observed canvas size.
    pub fn canvas_dom_size(&self) -> Option<CanvasSize> {
        self.canvas_dom_size
    }

    /// Attached canvas, if any.
    pub fn canvas(&self) -> Option<&WaveformCanvas> {
        self.canvas.as_ref()
    }

    /// Message of the last initialization failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Active tunables.
    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }
}
