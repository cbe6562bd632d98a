//! Per-frame redraw loop for the playback cursor.
//!
//! The host calls [`PlaybackAnimation::tick`] once per displayed frame and
//! schedules another frame while it returns `true`.

use tracing::trace;

use crate::track::Track;

/// Cooperative redraw loop with a continuation flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackAnimation {
    active: bool,
    frames: u64,
}

impl PlaybackAnimation {
    /// Idle loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin redrawing every frame.
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Stop after the current frame.
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// True while another frame should be scheduled.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frames drawn since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Redraw `track`; returns whether to schedule the next frame.
    ///
    /// The loop cancels itself once playback stops, after drawing one final
    /// frame so the cursor disappears.
    pub fn tick(&mut self, track: &mut Track) -> bool {
        if !self.active {
            return false;
        }
        track.sync_playback();
        track.draw();
        self.frames += 1;
        if !track.is_playing() {
            trace!(frames = self.frames, "Playback animation stopped");
            self.active = false;
        }
        self.active
    }
}
