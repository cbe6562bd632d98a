//! Loop playback on top of an [`AudioContext`].
//!
//! At most one source node is live. Starting playback always stops and
//! disconnects the previous node first.

use std::sync::Arc;

use tracing::debug;

use super::buffer::AudioBuffer;
use super::context::AudioContext;
use super::gain::GainControl;
use super::mixer::SourceNode;
use super::voice::FrameSpan;
use crate::track::Locator;

/// Playback bounds in absolute buffer time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopTimes {
    /// Start in seconds.
    pub start: f64,
    /// End in seconds; the buffer end for one-shot playback.
    pub end: f64,
    /// True when the source wraps at `end`.
    pub looping: bool,
}

impl LoopTimes {
    /// Bounds for a normalized loop locator over a buffer of `duration` seconds.
    ///
    /// A loop with an end loops; an open loop plays once from its start; no
    /// loop plays once from `fallback_start` (normalized).
    pub fn from_locators(loop_region: Option<Locator>, fallback_start: f64, duration: f64) -> Self {
        let duration = duration.max(0.0);
        match loop_region {
            Some(Locator {
                start,
                end: Some(end),
            }) => Self {
                start: start * duration,
                end: end * duration,
                looping: true,
            },
            Some(Locator { start, end: None }) => Self {
                start: start * duration,
                end: duration,
                looping: false,
            },
            None => Self {
                start: fallback_start.clamp(0.0, 1.0) * duration,
                end: duration,
                looping: false,
            },
        }
    }

    /// Span length in seconds.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Buffer time reached after `elapsed` seconds of playback.
    pub fn cursor_seconds(&self, elapsed: f64) -> f64 {
        let elapsed = elapsed.max(0.0);
        let span = self.duration();
        if self.looping && span > 0.0 {
            (elapsed % span) + self.start
        } else {
            (self.start + elapsed).min(self.end.max(self.start))
        }
    }
}

/// Owns the live source node and the playback timestamp.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    source: Option<SourceNode>,
    started_at: Option<f64>,
    times: Option<LoopTimes>,
}

impl PlaybackScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any playing source with a new one covering `times`.
    pub fn play(
        &mut self,
        context: &AudioContext,
        buffer: &Arc<AudioBuffer>,
        gain: &GainControl,
        times: LoopTimes,
    ) {
        self.stop_source();
        let span = FrameSpan::from_seconds(buffer, times.start, times.end);
        let source = context.start_source(buffer.clone(), span, times.looping, gain.clone());
        let started_at = context.current_time();
        debug!(
            start = times.start,
            end = times.end,
            looping = times.looping,
            started_at,
            "Playback started"
        );
        self.source = Some(source);
        self.started_at = Some(started_at);
        self.times = Some(times);
    }

    /// Stop the source. Returns `false` when nothing was playing.
    pub fn pause(&mut self) -> bool {
        if self.started_at.is_none() {
            return false;
        }
        self.stop_source();
        self.started_at = None;
        debug!("Playback paused");
        true
    }

    /// True between `play` and `pause`.
    pub fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    /// Audio-clock time of the current playback segment.
    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    /// Bounds of the current or most recent playback.
    pub fn loop_times(&self) -> Option<LoopTimes> {
        self.times
    }

    /// True when a one-shot source played to its end.
    pub fn has_finished(&self) -> bool {
        self.started_at.is_some() && self.source.as_ref().is_none_or(SourceNode::is_finished)
    }

    /// Buffer time under the cursor at audio-clock time `now`.
    pub fn cursor_seconds(&self, now: f64) -> Option<f64> {
        let started_at = self.started_at?;
        let times = self.times?;
        Some(times.cursor_seconds(now - started_at))
    }

    fn stop_source(&mut self) {
        if let Some(source) = self.source.take() {
            source.stop();
        }
    }
}
