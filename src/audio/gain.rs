use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Gain and pan shared between the UI thread and the audio callback.
///
/// Writes are visible to the next rendered frame, so changes apply without
/// any ramp.
#[derive(Clone, Debug)]
pub struct GainControl {
    gain: Arc<AtomicU32>,
    pan: Arc<AtomicU32>,
}

impl Default for GainControl {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl GainControl {
    /// Control starting at `gain` (0..=1) and `pan` (-1..=1).
    pub fn new(gain: f32, pan: f32) -> Self {
        let control = Self {
            gain: Arc::new(AtomicU32::new(0)),
            pan: Arc::new(AtomicU32::new(0)),
        };
        control.set_gain(gain);
        control.set_pan(pan);
        control
    }

    /// Store a linear gain, clamped to `[0, 1]`.
    pub fn set_gain(&self, gain: f32) -> f32 {
        let gain = sanitize(gain, 0.0, 1.0);
        self.gain.store(gain.to_bits(), Ordering::Release);
        gain
    }

    /// Current linear gain.
    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Acquire))
    }

    /// Store a pan position, clamped to `[-1, 1]`.
    pub fn set_pan(&self, pan: f32) -> f32 {
        let pan = sanitize(pan, -1.0, 1.0);
        self.pan.store(pan.to_bits(), Ordering::Release);
        pan
    }

    /// Current pan position.
    pub fn pan(&self) -> f32 {
        f32::from_bits(self.pan.load(Ordering::Acquire))
    }

    /// Left and right multipliers for the current gain and pan.
    pub fn channel_gains(&self) -> (f32, f32) {
        let gain = self.gain();
        let pan = self.pan();
        (gain * (1.0 - pan).min(1.0), gain * (1.0 + pan).min(1.0))
    }
}

fn sanitize(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min.max(0.0)
    }
}
