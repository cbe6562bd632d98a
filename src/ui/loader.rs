use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::warn;

use crate::audio::{AudioBuffer, DecodeError, decode_audio};
use crate::track::TrackSource;

/// Decode running on a background thread.
pub(super) struct PendingDecode {
    rx: Receiver<Result<AudioBuffer, DecodeError>>,
}

impl PendingDecode {
    /// Start decoding `request` off the UI thread.
    pub(super) fn spawn(request: &TrackSource) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let bytes = request.bytes.clone();
        let extension = request.extension().map(str::to_owned);
        thread::Builder::new()
            .name("audio-decode".to_string())
            .spawn(move || {
                let result = decode_audio(&bytes, extension.as_deref());
                let _ = tx.send(result);
            })?;
        Ok(Self { rx })
    }

    /// The decode result once the worker finished.
    pub(super) fn poll(&self) -> Option<Result<AudioBuffer, DecodeError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("Decoder thread exited without a result");
                Some(Err(DecodeError::Codec {
                    message: "decoder thread exited".to_string(),
                }))
            }
        }
    }
}
