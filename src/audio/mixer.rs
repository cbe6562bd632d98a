use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::voice::Voice;

/// Voices pulled by the output callback, plus the frame clock.
pub(crate) struct Mixer {
    voices: Vec<(u64, Voice)>,
    next_id: u64,
    frames_rendered: u64,
    sample_rate: u32,
    channels: u16,
}

impl Mixer {
    pub(crate) fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            voices: Vec::new(),
            next_id: 1,
            frames_rendered: 0,
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub(crate) fn shared(sample_rate: u32, channels: u16) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new(sample_rate, channels)))
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub(crate) fn channels(&self) -> u16 {
        self.channels
    }

    /// Seconds of audio rendered so far.
    pub(crate) fn current_time(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    pub(crate) fn add(&mut self, voice: Voice) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.voices.push((id, voice));
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.voices.len();
        self.voices.retain(|(voice_id, _)| *voice_id != id);
        self.voices.len() != before
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.voices.iter().any(|(voice_id, _)| *voice_id == id)
    }

    pub(crate) fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Overwrite `out` with the mix of all voices and advance the clock.
    pub(crate) fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let channels = self.channels as usize;
        self.voices
            .retain_mut(|(_, voice)| voice.render(out, channels));
        self.frames_rendered += (out.len() / channels) as u64;
    }
}

pub(crate) fn lock(mixer: &Mutex<Mixer>) -> MutexGuard<'_, Mixer> {
    mixer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one voice inside a mixer.
///
/// Dropping the handle does not stop the voice; call [`SourceNode::stop`].
pub struct SourceNode {
    id: u64,
    mixer: Arc<Mutex<Mixer>>,
}

impl SourceNode {
    pub(crate) fn new(id: u64, mixer: Arc<Mutex<Mixer>>) -> Self {
        Self { id, mixer }
    }

    /// Stop and disconnect the voice. Returns `false` if it had already ended.
    pub fn stop(&self) -> bool {
        lock(&self.mixer).remove(self.id)
    }

    /// True once the voice ran out of frames or was stopped.
    pub fn is_finished(&self) -> bool {
        !lock(&self.mixer).contains(self.id)
    }
}

impl std::fmt::Debug for SourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceNode").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBuffer, FrameSpan, GainControl};

    fn constant_voice(value: f32, frames: usize, looping: bool) -> Voice {
        let buffer = Arc::new(AudioBuffer::new(10, 1, vec![value; frames]));
        Voice::new(buffer, FrameSpan { start: 0, end: frames }, looping, 10, GainControl::default())
    }

    #[test]
    fn render_mixes_voices_and_advances_clock() {
        let mut mixer = Mixer::new(10, 1);
        mixer.add(constant_voice(0.25, 10, true));
        mixer.add(constant_voice(0.5, 10, true));
        let mut out = vec![1.0; 5];
        mixer.render(&mut out);
        assert!(out.iter().all(|s| (*s - 0.75).abs() < 1e-6));
        assert_eq!(mixer.current_time(), 0.5);
    }

    #[test]
    fn finished_voices_are_dropped() {
        let mut mixer = Mixer::new(10, 2);
        let id = mixer.add(constant_voice(0.5, 2, false));
        let mut out = vec![0.0; 8];
        mixer.render(&mut out);
        assert!(!mixer.contains(id));
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn source_node_stop_removes_voice() {
        let mixer = Mixer::shared(10, 1);
        let id = lock(&mixer).add(constant_voice(0.5, 4, true));
        let node = SourceNode::new(id, mixer.clone());
        assert!(!node.is_finished());
        assert!(node.stop());
        assert!(node.is_finished());
        assert!(!node.stop());
    }
}
