use std::sync::Arc;

use super::buffer::AudioBuffer;
use super::gain::GainControl;

/// Frame range of a buffer to play, `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSpan {
    /// First frame.
    pub start: usize,
    /// One past the last frame.
    pub end: usize,
}

impl FrameSpan {
    /// Span between two times in seconds, clamped to the buffer and at least one frame long.
    pub fn from_seconds(buffer: &AudioBuffer, start: f64, end: f64) -> Self {
        let frames = buffer.frames();
        let rate = buffer.sample_rate() as f64;
        let to_frame = |seconds: f64| {
            if seconds.is_finite() && seconds > 0.0 {
                ((seconds * rate).round() as usize).min(frames)
            } else {
                0
            }
        };
        let start = to_frame(start).min(frames.saturating_sub(1));
        let end = to_frame(end).max(start + 1).min(frames.max(start + 1));
        Self { start, end }
    }

    /// Frame count.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for a zero-length span.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A playing buffer region, rendered at the output rate.
///
/// Loops wrap on the exact frame boundary of the span; the read position is
/// fractional so buffers at another rate are resampled linearly.
pub struct Voice {
    buffer: Arc<AudioBuffer>,
    span: FrameSpan,
    looping: bool,
    position: f64,
    step: f64,
    gain: GainControl,
}

impl Voice {
    /// Voice reading `span` of `buffer` for an output running at `output_rate`.
    pub fn new(
        buffer: Arc<AudioBuffer>,
        span: FrameSpan,
        looping: bool,
        output_rate: u32,
        gain: GainControl,
    ) -> Self {
        let step = if output_rate == 0 {
            1.0
        } else {
            buffer.sample_rate() as f64 / output_rate as f64
        };
        Self {
            position: span.start as f64,
            buffer,
            span,
            looping,
            step,
            gain,
        }
    }

    /// Add interleaved output frames into `out`; returns `false` once finished.
    pub fn render(&mut self, out: &mut [f32], channels: usize) -> bool {
        if self.span.is_empty() || channels == 0 {
            return false;
        }
        let end = self.span.end as f64;
        let (left_gain, right_gain) = self.gain.channel_gains();
        for frame in out.chunks_exact_mut(channels) {
            if self.position >= end {
                if !self.looping {
                    return false;
                }
                self.position = self.span.start as f64 + (self.position - end) % self.span.len() as f64;
            }
            let (left, right) = self.read_stereo();
            let (left, right) = (left * left_gain, right * right_gain);
            match frame {
                [mono] => *mono += (left + right) * 0.5,
                [l, r, rest @ ..] => {
                    *l += left;
                    *r += right;
                    for extra in rest {
                        *extra += (left + right) * 0.5;
                    }
                }
                [] => {}
            }
            self.position += self.step;
        }
        self.looping || self.position < end
    }

    fn read_stereo(&self) -> (f32, f32) {
        let index = self.position.floor() as usize;
        let fraction = (self.position - index as f64) as f32;
        let next = if index + 1 < self.span.end {
            index + 1
        } else if self.looping {
            self.span.start
        } else {
            index
        };
        let stereo = self.buffer.channels() > 1;
        let read = |frame: usize| {
            let left = self.buffer.sample(frame, 0);
            let right = if stereo { self.buffer.sample(frame, 1) } else { left };
            (left, right)
        };
        let (l0, r0) = read(index);
        if fraction == 0.0 {
            return (l0, r0);
        }
        let (l1, r1) = read(next);
        (l0 + (l1 - l0) * fraction, r0 + (r1 - r0) * fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer::new(
            10,
            1,
            (0..frames).map(|i| i as f32 / 10.0).collect(),
        ))
    }

    #[test]
    fn frame_span_rounds_and_clamps_seconds() {
        let buffer = ramp(10);
        assert_eq!(FrameSpan::from_seconds(&buffer, 0.2, 0.6), FrameSpan { start: 2, end: 6 });
        assert_eq!(FrameSpan::from_seconds(&buffer, -1.0, 9.0), FrameSpan { start: 0, end: 10 });
        assert_eq!(FrameSpan::from_seconds(&buffer, 0.5, 0.5).len(), 1);
    }

    #[test]
    fn looping_voice_wraps_on_span_boundary() {
        let buffer = ramp(10);
        let mut voice = Voice::new(buffer, FrameSpan { start: 2, end: 5 }, true, 10, GainControl::default());
        let mut out = vec![0.0; 7];
        assert!(voice.render(&mut out, 1));
        let expected = [0.2, 0.3, 0.4, 0.2, 0.3, 0.4, 0.2];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{out:?}");
        }
    }

    #[test]
    fn one_shot_voice_finishes_at_span_end() {
        let buffer = ramp(4);
        let mut voice = Voice::new(buffer, FrameSpan { start: 1, end: 4 }, false, 10, GainControl::default());
        let mut out = vec![0.0; 8];
        assert!(!voice.render(&mut out, 2));
        assert_eq!(&out[..6], &[0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
        assert_eq!(&out[6..], &[0.0, 0.0]);
    }

    #[test]
    fn gain_changes_apply_to_next_render() {
        let buffer = Arc::new(AudioBuffer::new(10, 1, vec![1.0; 10]));
        let gain = GainControl::default();
        let mut voice = Voice::new(buffer, FrameSpan { start: 0, end: 10 }, true, 10, gain.clone());
        let mut out = vec![0.0; 1];
        voice.render(&mut out, 1);
        assert_eq!(out[0], 1.0);
        gain.set_gain(0.5);
        let mut out = vec![0.0; 1];
        voice.render(&mut out, 1);
        assert_eq!(out[0], 0.5);
    }

    #[test]
    fn slower_output_rate_interpolates_between_frames() {
        let buffer = ramp(4);
        let mut voice = Voice::new(buffer, FrameSpan { start: 0, end: 4 }, false, 20, GainControl::default());
        let mut out = vec![0.0; 3];
        voice.render(&mut out, 1);
        assert!((out[1] - 0.05).abs() < 1e-6);
        assert!((out[2] - 0.1).abs() < 1e-6);
    }
}
