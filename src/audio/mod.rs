//! Decoding, output and loop scheduling.

mod buffer;
mod context;
mod decode;
mod gain;
mod mixer;
mod output;
mod scheduler;
mod voice;

pub use buffer::AudioBuffer;
pub use context::{AudioBackend, AudioContext};
pub use decode::{DecodeError, decode_audio};
pub use gain::GainControl;
pub use mixer::SourceNode;
pub use output::{AudioOutputConfig, AudioOutputError, ResolvedOutput};
pub use scheduler::{LoopTimes, PlaybackScheduler};
pub use voice::{FrameSpan, Voice};

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    /// In-memory 32-bit float WAV.
    pub(crate) fn wav_bytes(sample_rate: u32, channels: u16, samples: &[f32]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
            for &sample in samples {
                writer.write_sample(sample).expect("write sample");
            }
            writer.finalize().expect("finalize wav");
        }
        cursor.into_inner()
    }

    /// Silent WAV of the given length.
    pub(crate) fn silent_wav(sample_rate: u32, channels: u16, seconds: f32) -> Vec<u8> {
        let frames = (sample_rate as f32 * seconds) as usize;
        wav_bytes(sample_rate, channels, &vec![0.0; frames * channels as usize])
    }
}
