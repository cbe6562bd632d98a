use egui::ColorImage;
use tracing::debug;

use super::{CanvasSize, Track};
use crate::waveform::{Overlays, WaveformCanvas};

impl Track {
    /// Bind a rendering surface of `size` device-independent pixels and start
    /// observing its resizes.
    pub fn attach_canvas(&mut self, size: CanvasSize) {
        let mut canvas = WaveformCanvas::new(0, 0, self.settings.style.clone());
        canvas.set_samples(self.samples.clone(), self.zoom_window());
        self.canvas = Some(canvas);
        self.canvas_dom_size = None;
        self.observe_resize(size);
    }

    /// Drop the rendering surface; later resizes and draws are ignored.
    pub fn detach_canvas(&mut self) {
        self.canvas = None;
        self.canvas_dom_size = None;
    }

    /// Follow a size change of the rendering surface and redraw.
    ///
    /// Zero-sized or unchanged sizes and detached canvases are ignored.
    pub fn observe_resize(&mut self, size: CanvasSize) {
        if self.canvas.is_none() || size.width <= 0.0 || size.height <= 0.0 {
            return;
        }
        if self.canvas_dom_size == Some(size) {
            return;
        }
        let factor = self.settings.resolution_factor.max(0.0);
        let width = (size.width * factor).round() as usize;
        let height = (size.height * factor).round() as usize;
        if width == 0 || height == 0 {
            return;
        }
        let window = self.zoom_window();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.resize(width, height, window);
        }
        self.canvas_dom_size = Some(size);
        debug!(width, height, "Canvas resized");
        self.draw();
    }

    /// Render the waveform and overlays. No-op without a canvas.
    pub fn draw(&mut self) {
        let overlays = self.overlays();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.draw(&overlays);
        }
    }

    /// Composite from the last draw.
    pub fn canvas_image(&self) -> Option<&ColorImage> {
        self.canvas.as_ref().map(WaveformCanvas::image)
    }

    /// Replace the waveform colors and redraw.
    pub fn set_style(&mut self, style: crate::waveform::RenderStyle) {
        self.settings.style = style.clone();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_style(style);
        }
        self.draw();
    }

    pub(super) fn sync_canvas_window(&mut self) {
        let window = self.zoom_window();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_window(window);
        }
    }

    fn overlays(&self) -> Overlays {
        let window = self.zoom_window();
        Overlays {
            cursor: self.cursor_local(),
            hover: self.locators.hover().map(|hover| window.to_local(hover.start)),
            loop_region: self
                .locators
                .loop_region()
                .map(|region| window.locator_to_local(region)),
        }
    }
}
