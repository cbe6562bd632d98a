use tracing::debug;

use super::Track;
use crate::audio::LoopTimes;

impl Track {
    /// Start (or restart) playback of the loop region.
    ///
    /// No-op until the track is initialized.
    pub fn play(&mut self) {
        let (Some(context), Some(buffer), Some(gain)) = (
            self.audio_context.as_ref(),
            self.audio_buffer.as_ref(),
            self.gain_control.as_ref(),
        ) else {
            return;
        };
        let times = self.loop_times();
        self.scheduler.play(context, buffer, gain, times);
    }

    /// Stop playback. No-op when not playing.
    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    /// Play when paused, pause when playing.
    pub fn toggle_playback(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// True between `play` and `pause`.
    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Audio-clock time at which the current playback segment started.
    pub fn started_playing_at(&self) -> Option<f64> {
        self.scheduler.started_at()
    }

    /// Bounds `play` would use right now.
    pub fn loop_times(&self) -> LoopTimes {
        LoopTimes::from_locators(
            self.locators.loop_region(),
            self.zoom_window().start,
            self.duration(),
        )
    }

    /// Bounds of the playback in progress.
    pub fn active_loop_times(&self) -> Option<LoopTimes> {
        self.scheduler
            .is_playing()
            .then(|| self.scheduler.loop_times())
            .flatten()
    }

    /// Set the gain immediately, clamped to `[0, 1]`.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = match self.gain_control.as_ref() {
            Some(control) => control.set_gain(gain),
            None if gain.is_finite() => gain.clamp(0.0, 1.0),
            None => 0.0,
        };
        debug!(gain = self.gain, "Gain changed");
    }

    /// Set the pan immediately, clamped to `[-1, 1]`. Ignored for mono buffers.
    pub fn set_pan(&mut self, pan: f32) {
        if self.is_mono() {
            return;
        }
        self.pan = match self.gain_control.as_ref() {
            Some(control) => control.set_pan(pan),
            None if pan.is_finite() => pan.clamp(-1.0, 1.0),
            None => 0.0,
        };
        debug!(pan = self.pan, "Pan changed");
    }

    /// Normalized playback position, `None` when not playing.
    pub fn cursor_position(&self) -> Option<f64> {
        let context = self.audio_context.as_ref()?;
        let duration = self.duration();
        if duration <= 0.0 {
            return None;
        }
        let seconds = self.scheduler.cursor_seconds(context.current_time())?;
        Some(seconds / duration)
    }

    /// Playback position in local coordinates of the visible window.
    pub fn cursor_local(&self) -> Option<f64> {
        self.cursor_position()
            .map(|normalized| self.zoom_window().to_local(normalized))
    }

    /// Pause once a one-shot playback reached the end of the buffer.
    ///
    /// Returns `true` when playback stopped.
    pub fn sync_playback(&mut self) -> bool {
        if self.scheduler.has_finished() {
            self.pause();
            return true;
        }
        false
    }
}
