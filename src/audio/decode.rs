//! Whole-file decoding into an [`AudioBuffer`].
//!
//! WAV data goes through `hound` directly; everything else is probed and
//! decoded with Symphonia.

use std::io::Cursor;
use std::sync::Arc;

use hound::SampleFormat;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

use super::buffer::AudioBuffer;

/// Errors raised while turning encoded bytes into PCM.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes were provided.
    #[error("Audio data is empty")]
    Empty,
    /// The container format was not recognized.
    #[error("Unsupported or corrupt audio: {message}")]
    Unsupported {
        /// Probe failure description.
        message: String,
    },
    /// The container holds no decodable audio track.
    #[error("No decodable audio track found")]
    NoTrack,
    /// A codec could not be created or failed mid-stream.
    #[error("Audio decoding failed: {message}")]
    Codec {
        /// Codec failure description.
        message: String,
    },
    /// A WAV sample could not be read.
    #[error("Invalid wav sample: {source}")]
    Sample {
        /// Underlying hound error.
        source: hound::Error,
    },
    /// Decoding produced no frames.
    #[error("Audio contains no frames")]
    NoFrames,
}

/// Decode `bytes`, using `extension` as a container hint when present.
pub fn decode_audio(bytes: &[u8], extension: Option<&str>) -> Result<AudioBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let buffer = match decode_wav(bytes)? {
        Some(buffer) => buffer,
        None => decode_with_symphonia(bytes, extension)?,
    };
    if buffer.frames() == 0 || buffer.sample_rate() == 0 {
        return Err(DecodeError::NoFrames);
    }
    debug!(
        frames = buffer.frames(),
        channels = buffer.channels(),
        sample_rate = buffer.sample_rate(),
        "Decoded audio"
    );
    Ok(buffer)
}

fn decode_wav(bytes: &[u8]) -> Result<Option<AudioBuffer>, DecodeError> {
    let mut reader = match hound::WavReader::new(Cursor::new(bytes)) {
        Ok(reader) => reader,
        Err(_) => return Ok(None),
    };
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map_err(|source| DecodeError::Sample { source }))
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << spec.bits_per_sample.saturating_sub(1)).max(1) as f32;
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|value| value as f32 / scale)
                        .map_err(|source| DecodeError::Sample { source })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(Some(AudioBuffer::new(spec.sample_rate, spec.channels, samples)))
}

fn decode_with_symphonia(bytes: &[u8], extension: Option<&str>) -> Result<AudioBuffer, DecodeError> {
    let data: Arc<[u8]> = Arc::from(bytes);
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|error| DecodeError::Unsupported {
            message: error.to_string(),
        })?;
    let mut reader = probed.format;
    let track = reader
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|channels| channels.count() as u16)
        .unwrap_or(0);
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|error| DecodeError::Codec {
            message: error.to_string(),
        })?;

    let mut samples = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(error))
                if error.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(error) => {
                return Err(DecodeError::Codec {
                    message: error.to_string(),
                });
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut chunk = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                chunk.copy_interleaved_ref(decoded);
                samples.extend_from_slice(chunk.samples());
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;
            }
            Err(SymphoniaError::DecodeError(message)) => {
                warn!("Skipping undecodable packet: {message}");
            }
            Err(error) => {
                return Err(DecodeError::Codec {
                    message: error.to_string(),
                });
            }
        }
    }
    if channels == 0 {
        return Err(DecodeError::NoFrames);
    }
    Ok(AudioBuffer::new(sample_rate, channels, samples))
}
