use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{InitializeError, Track, TrackSource, TrackStatus};
use crate::audio::{AudioBuffer, DecodeError, GainControl, PlaybackScheduler, decode_audio};
use crate::track::{Locators, ZoomState};

impl Track {
    /// Decode `request` and open the audio output.
    ///
    /// Failures never escape: they leave the track in
    /// [`TrackStatus::FailedToInitialize`] with [`Track::last_error`] set.
    #[instrument(skip_all, fields(source = %request.source))]
    pub fn initialize(&mut self, request: TrackSource) -> TrackStatus {
        self.begin_initialize(&request);
        let decoded = decode_audio(&request.bytes, request.extension());
        self.complete_initialize(decoded)
    }

    /// First half of [`Track::initialize`]: record metadata and mark the track
    /// as initializing so the decode can run elsewhere.
    ///
    /// The previous buffer, locators and zoom window are dropped; an attached
    /// canvas stays attached.
    ///
    /// Calling this while already initializing is the caller's mistake; the
    /// later completion wins.
    #[instrument(skip_all, fields(source = %request.source))]
    pub fn begin_initialize(&mut self, request: &TrackSource) {
        if self.status == TrackStatus::Initializing {
            warn!("Track initialization restarted before the previous one finished");
        }
        self.pause();
        self.locators = Locators::default();
        self.zoom_state = ZoomState::default();
        self.release_audio();
        self.status = TrackStatus::Initializing;
        self.display_name = request.display_name.clone();
        self.source = request.source.clone();
        self.last_error = None;
        info!("Initializing track \"{}\"", self.display_name);
    }

    /// Second half of [`Track::initialize`]: adopt the decoded buffer.
    pub fn complete_initialize(
        &mut self,
        decoded: Result<AudioBuffer, DecodeError>,
    ) -> TrackStatus {
        if self.status != TrackStatus::Initializing {
            debug!("Dropping decode result for a track that is no longer initializing");
            return self.status;
        }
        match self.adopt(decoded) {
            Ok(()) => {
                self.status = TrackStatus::Initialized;
                info!(
                    source = %self.source,
                    "Track ready: {} frames, {:.2}s, {} channel(s)",
                    self.samples.len(),
                    self.duration(),
                    self.audio_buffer.as_ref().map_or(0, |b| b.channels())
                );
            }
            Err(err) => {
                warn!("Track failed to initialize: {err}");
                self.release_audio();
                self.last_error = Some(err.to_string());
                self.status = TrackStatus::FailedToInitialize;
            }
        }
        self.status
    }

    fn adopt(&mut self, decoded: Result<AudioBuffer, DecodeError>) -> Result<(), InitializeError> {
        let buffer = Arc::new(decoded?);
        let context = self.backend.open()?;
        let samples: Arc<[f32]> = Arc::from(buffer.mono_samples());
        if buffer.channels() < 2 {
            self.pan = 0.0;
        }
        self.gain_control = Some(GainControl::new(self.gain, self.pan));
        self.audio_context = Some(context);
        self.audio_buffer = Some(buffer);
        self.samples = samples.clone();
        let window = self.zoom_window();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_samples(samples, window);
        }
        Ok(())
    }

    /// Pause, detach the canvas and return every field to its default.
    pub fn clear(&mut self) {
        self.pause();
        self.detach_canvas();
        self.release_audio();
        self.status = TrackStatus::Uninitialized;
        self.display_name.clear();
        self.source.clear();
        self.gain = self.settings.default_gain.clamp(0.0, 1.0);
        self.pan = 0.0;
        self.locators = Locators::default();
        self.zoom_state = ZoomState::default();
        self.last_error = None;
        debug!("Track cleared");
    }

    fn release_audio(&mut self) {
        self.scheduler = PlaybackScheduler::new();
        self.samples = Arc::from(Vec::new());
        let window = self.zoom_window();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_samples(self.samples.clone(), window);
        }
        self.audio_buffer = None;
        self.gain_control = None;
        self.audio_context = None;
    }
}
