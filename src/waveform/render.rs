//! Two-pass waveform renderer.
//!
//! The silhouette is rasterized into an offscreen image only when the peak
//! cache was invalidated; every draw copies it into the visible image and
//! paints the cursor, hover and loop overlays on top.

use std::sync::Arc;

use egui::{Color32, ColorImage};
use serde::{Deserialize, Serialize};

use super::peaks::PeakCache;
use super::raster;
use crate::track::{Locator, ZoomWindow};

/// Colors and sizes used by [`WaveformCanvas`], as straight-alpha RGBA.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Gradient color at the top edge.
    pub gradient_top: [u8; 4],
    /// Gradient color at the bottom edge.
    pub gradient_bottom: [u8; 4],
    /// Playback cursor bar.
    pub cursor: [u8; 4],
    /// Hover marker bar.
    pub hover: [u8; 4],
    /// Loop band, or the bar of an open-ended loop.
    pub loop_band: [u8; 4],
    /// Width of the cursor and marker bars in canvas pixels.
    pub cursor_width: f32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            gradient_top: [255, 255, 255, 255],
            gradient_bottom: [4, 247, 105, 128],
            cursor: [255, 255, 255, 204],
            hover: [255, 255, 255, 51],
            loop_band: [255, 255, 255, 102],
            cursor_width: 2.0,
        }
    }
}

/// Overlay positions for one draw, all in local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Overlays {
    /// Playback cursor.
    pub cursor: Option<f64>,
    /// Hover marker.
    pub hover: Option<f64>,
    /// Loop band; a bar when open-ended.
    pub loop_region: Option<Locator>,
}

/// Offscreen silhouette plus the visible composite.
pub struct WaveformCanvas {
    peaks: PeakCache,
    offscreen: ColorImage,
    visible: ColorImage,
    offscreen_valid: bool,
    offscreen_renders: u64,
    style: RenderStyle,
}

impl WaveformCanvas {
    /// Canvas of `width x height` canvas pixels.
    pub fn new(width: usize, height: usize, style: RenderStyle) -> Self {
        let mut peaks = PeakCache::new();
        peaks.configure(width, ZoomWindow::IDENTITY);
        Self {
            peaks,
            offscreen: raster::blank(width, height),
            visible: raster::blank(width, height),
            offscreen_valid: false,
            offscreen_renders: 0,
            style,
        }
    }

    /// `[width, height]` in canvas pixels.
    pub fn size(&self) -> [usize; 2] {
        self.visible.size
    }

    /// Resize both images and re-layout the peak columns.
    pub fn resize(&mut self, width: usize, height: usize, window: ZoomWindow) {
        raster::clear(&mut self.offscreen, width, height);
        raster::clear(&mut self.visible, width, height);
        self.peaks.configure(width, window);
        self.offscreen_valid = false;
    }

    /// Install a new sample set.
    pub fn set_samples(&mut self, samples: Arc<[f32]>, window: ZoomWindow) {
        self.peaks.set_samples(samples);
        self.set_window(window);
    }

    /// Follow a zoom change.
    pub fn set_window(&mut self, window: ZoomWindow) {
        let width = self.size()[0];
        self.peaks.configure(width, window);
        self.offscreen_valid = false;
    }

    /// Replace the style and force a silhouette rebuild.
    pub fn set_style(&mut self, style: RenderStyle) {
        self.style = style;
        self.offscreen_valid = false;
    }

    /// True while the offscreen silhouette matches the peak cache.
    pub fn is_offscreen_valid(&self) -> bool {
        self.offscreen_valid
    }

    /// Number of silhouette rebuilds so far.
    pub fn offscreen_renders(&self) -> u64 {
        self.offscreen_renders
    }

    /// Peak cache backing the silhouette.
    pub fn peaks(&self) -> &PeakCache {
        &self.peaks
    }

    /// Composite produced by the last draw.
    pub fn image(&self) -> &ColorImage {
        &self.visible
    }

    /// Run both passes.
    pub fn draw(&mut self, overlays: &Overlays) {
        if !self.offscreen_valid {
            self.render_offscreen();
        }
        raster::copy_into(&mut self.visible, &self.offscreen);
        self.render_overlays(overlays);
    }

    fn render_offscreen(&mut self) {
        let [width, height] = self.offscreen.size;
        raster::clear(&mut self.offscreen, width, height);
        if width > 0 && height > 0 {
            let path = self.silhouette_path(width, height as f32 / 2.0);
            raster::fill_polygon_gradient(
                &mut self.offscreen,
                &path,
                self.style.gradient_top,
                self.style.gradient_bottom,
            );
        }
        self.offscreen_valid = true;
        self.offscreen_renders += 1;
    }

    /// Positive peaks left to right, then negative peaks right to left.
    fn silhouette_path(&mut self, width: usize, center_y: f32) -> Vec<(f32, f32)> {
        let mut path = Vec::with_capacity(width * 2 + 2);
        path.push((0.0, center_y));
        for i in 0..width * 2 {
            let positive = i < width;
            let x = if positive { i } else { width * 2 - 1 - i };
            let peak = self.peaks.peak(x, positive).clamp(-1.0, 1.0);
            path.push((x as f32 + 0.5, center_y - center_y * peak));
            if i + 1 == width {
                path.push((width as f32, center_y));
            }
        }
        path
    }

    fn render_overlays(&mut self, overlays: &Overlays) {
        let [width, height] = self.visible.size;
        let width = width as f32;
        let height = height as f32;
        let bar = self.style.cursor_width;
        if let Some(cursor) = overlays.cursor {
            let x = cursor as f32 * width;
            raster::fill_rect(&mut self.visible, x - bar, 0.0, bar, height, raster::color(self.style.cursor));
        }
        if let Some(hover) = overlays.hover {
            let x = hover as f32 * width;
            raster::fill_rect(&mut self.visible, x - bar, 0.0, bar, height, raster::color(self.style.hover));
        }
        if let Some(region) = overlays.loop_region {
            let color: Color32 = raster::color(self.style.loop_band);
            let start = region.start as f32 * width;
            match region.end {
                Some(end) => {
                    let end = end as f32 * width;
                    raster::fill_rect(&mut self.visible, start, 0.0, end - start, height, color);
                }
                None => raster::fill_rect(&mut self.visible, start - bar, 0.0, bar, height, color),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with(samples: Vec<f32>, width: usize, height: usize) -> WaveformCanvas {
        let mut canvas = WaveformCanvas::new(width, height, RenderStyle::default());
        canvas.set_samples(Arc::from(samples), ZoomWindow::IDENTITY);
        canvas
    }

    fn pixel(canvas: &WaveformCanvas, x: usize, y: usize) -> Color32 {
        canvas.image().pixels[y * canvas.size()[0] + x]
    }

    #[test]
    fn silence_leaves_canvas_transparent() {
        let mut canvas = canvas_with(vec![0.0; 64], 8, 8);
        canvas.draw(&Overlays::default());
        assert!(canvas.image().pixels.iter().all(|p| p.a() == 0));
        assert!(canvas.is_offscreen_valid());
    }

    #[test]
    fn full_scale_signal_fills_every_row() {
        let samples: Vec<f32> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut canvas = canvas_with(samples, 8, 8);
        canvas.draw(&Overlays::default());
        assert!(pixel(&canvas, 4, 0).a() > 0);
        assert!(pixel(&canvas, 4, 7).a() > 0);
        assert_eq!(pixel(&canvas, 4, 0), Color32::WHITE);
    }

    #[test]
    fn offscreen_pass_runs_only_after_invalidation() {
        let mut canvas = canvas_with(vec![0.5; 32], 4, 4);
        canvas.draw(&Overlays::default());
        canvas.draw(&Overlays::default());
        assert_eq!(canvas.offscreen_renders(), 1);

        canvas.set_window(ZoomWindow {
            start: 0.0,
            factor: 0.5,
        });
        assert!(!canvas.is_offscreen_valid());
        canvas.draw(&Overlays::default());
        assert_eq!(canvas.offscreen_renders(), 2);
    }

    #[test]
    fn overlays_are_painted_over_the_silhouette() {
        let mut canvas = canvas_with(vec![0.0; 100], 10, 2);
        canvas.draw(&Overlays {
            cursor: Some(0.5),
            hover: None,
            loop_region: Some(Locator::span(0.0, 0.2)),
        });
        assert_eq!(pixel(&canvas, 4, 0).a(), 204);
        assert_eq!(pixel(&canvas, 3, 1).a(), 204);
        assert_eq!(pixel(&canvas, 5, 0).a(), 0);
        assert_eq!(pixel(&canvas, 1, 0).a(), 102);
        assert_eq!(pixel(&canvas, 2, 0).a(), 0);
    }

    #[test]
    fn open_loop_draws_a_bar_at_its_start() {
        let mut canvas = canvas_with(vec![0.0; 100], 10, 1);
        canvas.draw(&Overlays {
            loop_region: Some(Locator::point(0.6)),
            ..Overlays::default()
        });
        assert_eq!(pixel(&canvas, 4, 0).a(), 102);
        assert_eq!(pixel(&canvas, 5, 0).a(), 102);
        assert_eq!(pixel(&canvas, 6, 0).a(), 0);
    }

    #[test]
    fn resize_changes_both_images() {
        let mut canvas = canvas_with(vec![0.2; 10], 4, 4);
        canvas.draw(&Overlays::default());
        canvas.resize(6, 3, ZoomWindow::IDENTITY);
        assert!(!canvas.is_offscreen_valid());
        canvas.draw(&Overlays::default());
        assert_eq!(canvas.size(), [6, 3]);
        assert_eq!(canvas.peaks().width(), 6);
    }
}
