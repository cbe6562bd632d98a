//! Audio clock and voice scheduling, backed by a device or rendered offline.

use std::sync::{Arc, Mutex};

use super::buffer::AudioBuffer;
use super::gain::GainControl;
use super::mixer::{self, Mixer, SourceNode};
use super::output::{AudioOutputConfig, AudioOutputError, ResolvedOutput, open_output_stream};
use super::voice::{FrameSpan, Voice};

/// Where an [`AudioContext`] sends its frames.
#[derive(Clone, Debug, PartialEq)]
pub enum AudioBackend {
    /// A cpal output device.
    Device(AudioOutputConfig),
    /// No device; frames are produced by [`AudioContext::render`].
    Offline {
        /// Output rate in Hz.
        sample_rate: u32,
        /// Output channel count.
        channels: u16,
    },
}

impl Default for AudioBackend {
    fn default() -> Self {
        Self::Device(AudioOutputConfig::default())
    }
}

impl AudioBackend {
    /// Open a context on this backend.
    pub fn open(&self) -> Result<AudioContext, AudioOutputError> {
        match self {
            Self::Device(config) => AudioContext::open_device(config),
            Self::Offline {
                sample_rate,
                channels,
            } => Ok(AudioContext::offline(*sample_rate, *channels)),
        }
    }
}

/// Output graph with a sample clock.
///
/// `current_time` counts rendered frames, so it advances with the device
/// callback rather than the wall clock.
pub struct AudioContext {
    mixer: Arc<Mutex<Mixer>>,
    output: Option<(cpal::Stream, ResolvedOutput)>,
}

impl AudioContext {
    /// Open an output device.
    pub fn open_device(config: &AudioOutputConfig) -> Result<Self, AudioOutputError> {
        let device = open_output_stream(config)?;
        Ok(Self {
            mixer: device.mixer,
            output: Some((device.stream, device.resolved)),
        })
    }

    /// Context whose clock only moves through [`AudioContext::render`].
    pub fn offline(sample_rate: u32, channels: u16) -> Self {
        Self {
            mixer: Mixer::shared(sample_rate.max(1), channels),
            output: None,
        }
    }

    /// Seconds of audio produced since the context opened.
    pub fn current_time(&self) -> f64 {
        mixer::lock(&self.mixer).current_time()
    }

    /// Output rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        mixer::lock(&self.mixer).sample_rate()
    }

    /// Output channel count.
    pub fn channels(&self) -> u16 {
        mixer::lock(&self.mixer).channels()
    }

    /// Device details, `None` for offline contexts.
    pub fn resolved_output(&self) -> Option<&ResolvedOutput> {
        self.output.as_ref().map(|(_, resolved)| resolved)
    }

    /// Number of voices currently connected.
    pub fn active_sources(&self) -> usize {
        mixer::lock(&self.mixer).active_voices()
    }

    /// Connect a new voice playing `span` of `buffer` through `gain`.
    pub fn start_source(
        &self,
        buffer: Arc<AudioBuffer>,
        span: FrameSpan,
        looping: bool,
        gain: GainControl,
    ) -> SourceNode {
        let mut mixer = mixer::lock(&self.mixer);
        let voice = Voice::new(buffer, span, looping, mixer.sample_rate(), gain);
        let id = mixer.add(voice);
        SourceNode::new(id, self.mixer.clone())
    }

    /// Pull `frames` interleaved output frames from an offline context.
    ///
    /// Device contexts are driven by their callback and return an empty buffer.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        if self.output.is_some() {
            return Vec::new();
        }
        let mut mixer = mixer::lock(&self.mixer);
        let mut out = vec![0.0; frames * mixer.channels() as usize];
        mixer.render(&mut out);
        out
    }

    /// Advance an offline clock by `seconds`, discarding the audio.
    pub fn advance(&self, seconds: f64) {
        let frames = (seconds.max(0.0) * self.sample_rate() as f64).round() as usize;
        let _ = self.render(frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_clock_follows_rendered_frames() {
        let context = AudioContext::offline(100, 2);
        assert_eq!(context.current_time(), 0.0);
        let out = context.render(50);
        assert_eq!(out.len(), 100);
        assert_eq!(context.current_time(), 0.5);
        context.advance(0.25);
        assert_eq!(context.current_time(), 0.75);
    }

    #[test]
    fn offline_backend_opens_without_a_device() {
        let backend = AudioBackend::Offline {
            sample_rate: 48_000,
            channels: 2,
        };
        let context = backend.open().unwrap();
        assert_eq!(context.sample_rate(), 48_000);
        assert_eq!(context.channels(), 2);
        assert!(context.resolved_output().is_none());
    }

    #[test]
    fn started_source_is_heard_until_stopped() {
        let context = AudioContext::offline(10, 1);
        let buffer = Arc::new(AudioBuffer::new(10, 1, vec![0.5; 10]));
        let node = context.start_source(buffer, FrameSpan { start: 0, end: 10 }, true, GainControl::default());
        assert_eq!(context.active_sources(), 1);
        assert!(context.render(3).iter().all(|s| *s == 0.5));
        node.stop();
        assert_eq!(context.active_sources(), 0);
        assert!(context.render(3).iter().all(|s| *s == 0.0));
    }
}
