//! Peak extraction and the two-pass waveform canvas.

pub mod peaks;
pub mod raster;
pub mod render;

pub use peaks::PeakCache;
pub use render::{Overlays, RenderStyle, WaveformCanvas};
