use std::sync::Arc;

/// Decoded PCM audio, interleaved `f32` frames.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    data: Arc<[f32]>,
}

impl AudioBuffer {
    /// Wrap interleaved samples; a trailing partial frame is dropped.
    pub fn new(sample_rate: u32, channels: u16, mut data: Vec<f32>) -> Self {
        let channels = channels.max(1);
        let whole = data.len() - data.len() % channels as usize;
        data.truncate(whole);
        Self {
            sample_rate,
            channels,
            data: Arc::from(data),
        }
    }

    /// Frames per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Interleaved samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sample of `channel` at `frame`, or silence out of range.
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.channels as usize;
        if channel >= channels {
            return 0.0;
        }
        self.data
            .get(frame * channels + channel)
            .copied()
            .unwrap_or(0.0)
    }

    /// One amplitude per frame: mean of the first two channels, or channel 0.
    pub fn mono_samples(&self) -> Vec<f32> {
        let channels = self.channels as usize;
        if channels == 1 {
            return self.data.to_vec();
        }
        self.data
            .chunks_exact(channels)
            .map(|frame| (frame[0] + frame[1]) * 0.5)
            .collect()
    }
}
