//! Output device selection and the cpal stream that pulls the mixer.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use super::mixer::{self, Mixer};

/// Errors that can occur while opening an audio output.
#[derive(Debug, Error)]
pub enum AudioOutputError {
    /// No audio output devices are available on the host.
    #[error("No audio output devices found")]
    NoOutputDevices,
    /// Failed to enumerate output devices on the host.
    #[error("Could not list output devices: {source}")]
    ListOutputDevices {
        /// Underlying cpal error.
        source: cpal::DevicesError,
    },
    /// Failed to resolve the default output config for a device.
    #[error("Default config error for {host_id}: {source}")]
    DefaultConfig {
        /// Host identifier used for the query.
        host_id: String,
        /// Underlying cpal error.
        source: cpal::DefaultStreamConfigError,
    },
    /// Failed to build an output stream.
    #[error("Failed to build stream: {source}")]
    BuildStream {
        /// Underlying cpal error.
        source: cpal::BuildStreamError,
    },
    /// Failed to start playback on an output stream.
    #[error("Playback failed to start: {source}")]
    PlayStream {
        /// Underlying cpal error.
        source: cpal::PlayStreamError,
    },
}

/// Persisted audio output preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AudioOutputConfig {
    /// Preferred host identifier (e.g. "alsa", "wasapi").
    pub host: Option<String>,
    /// Preferred device name.
    pub device: Option<String>,
    /// Preferred sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Preferred buffer size in frames.
    pub buffer_size: Option<u32>,
}

/// Parameters actually in use after opening a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOutput {
    /// Host identifier used to open the stream.
    pub host_id: String,
    /// Device name.
    pub device_name: String,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count provided by the device.
    pub channel_count: u16,
    /// Whether the requested host or device was unavailable.
    pub used_fallback: bool,
}

/// Running device stream plus the mixer it pulls from.
pub(crate) struct DeviceOutput {
    pub(crate) stream: cpal::Stream,
    pub(crate) mixer: Arc<Mutex<Mixer>>,
    pub(crate) resolved: ResolvedOutput,
}

/// Open the configured device, falling back to the host defaults.
pub(crate) fn open_output_stream(config: &AudioOutputConfig) -> Result<DeviceOutput, AudioOutputError> {
    let (host, host_id, host_fallback) = resolve_host(config.host.as_deref());
    let (device, device_name, device_fallback) = resolve_device(&host, config.device.as_deref())?;

    let supported = device
        .default_output_config()
        .map_err(|source| AudioOutputError::DefaultConfig {
            host_id: host_id.clone(),
            source,
        })?;
    let mut stream_config: cpal::StreamConfig = supported.into();
    if let Some(rate) = config.sample_rate.filter(|rate| *rate > 0) {
        stream_config.sample_rate = cpal::SampleRate(rate);
    }
    if let Some(size) = config.buffer_size.filter(|size| *size > 0) {
        stream_config.buffer_size = cpal::BufferSize::Fixed(size);
    }

    let sample_rate = stream_config.sample_rate.0;
    let mixer = Mixer::shared(sample_rate, stream_config.channels);
    let stream = build_stream(&device, &stream_config, mixer.clone())?;
    stream
        .play()
        .map_err(|source| AudioOutputError::PlayStream { source })?;

    let resolved = ResolvedOutput {
        host_id,
        device_name,
        sample_rate,
        channel_count: stream_config.channels,
        used_fallback: host_fallback || device_fallback,
    };
    if resolved.used_fallback {
        warn!("Requested audio output unavailable; using {}", resolved.device_name);
    }
    info!(
        "Audio output ready: host={} device=\"{}\" rate={}Hz channels={}",
        resolved.host_id, resolved.device_name, resolved.sample_rate, resolved.channel_count
    );
    Ok(DeviceOutput {
        stream,
        mixer,
        resolved,
    })
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream, AudioOutputError> {
    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer::lock(&mixer).render(data);
            },
            |err| error!("Audio stream error: {err}"),
            None,
        )
        .map_err(|source| AudioOutputError::BuildStream { source })
}

fn resolve_host(id: Option<&str>) -> (cpal::Host, String, bool) {
    let default_host = cpal::default_host();
    let default_id = default_host.id().name().to_string();
    let Some(requested) = id else {
        return (default_host, default_id, false);
    };
    let host = cpal::available_hosts()
        .into_iter()
        .find(|candidate| candidate.name() == requested)
        .and_then(|id| cpal::host_from_id(id).ok())
        .unwrap_or(default_host);
    let resolved_id = host.id().name().to_string();
    let used_fallback = resolved_id != requested;
    (host, resolved_id, used_fallback)
}

fn resolve_device(
    host: &cpal::Host,
    name: Option<&str>,
) -> Result<(cpal::Device, String, bool), AudioOutputError> {
    let default_device = host
        .default_output_device()
        .ok_or(AudioOutputError::NoOutputDevices)?;
    let default_name = device_label(&default_device).unwrap_or_else(|| "Default device".into());
    let Some(requested) = name else {
        return Ok((default_device, default_name, false));
    };
    let chosen = host
        .output_devices()
        .map_err(|source| AudioOutputError::ListOutputDevices { source })?
        .find(|device| device_label(device).is_some_and(|label| label == requested));
    match chosen {
        Some(device) => {
            let label = device_label(&device).unwrap_or_else(|| requested.to_string());
            Ok((device, label, false))
        }
        None => Ok((default_device, default_name, true)),
    }
}

fn device_label(device: &cpal::Device) -> Option<String> {
    device.name().ok()
}
