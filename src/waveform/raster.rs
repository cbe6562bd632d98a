//! Software raster primitives over `egui::ColorImage`.

use egui::{Color32, ColorImage};

/// Transparent image of `[width, height]` pixels.
pub fn blank(width: usize, height: usize) -> ColorImage {
    ColorImage::new([width, height], vec![Color32::TRANSPARENT; width * height])
}

/// Reset every pixel to transparent, resizing when needed.
pub fn clear(image: &mut ColorImage, width: usize, height: usize) {
    if image.size != [width, height] {
        *image = blank(width, height);
        return;
    }
    image.pixels.fill(Color32::TRANSPARENT);
}

/// Copy `source` over `target` pixel for pixel, clipped to the smaller size.
pub fn copy_into(target: &mut ColorImage, source: &ColorImage) {
    if target.size == source.size {
        target.pixels.copy_from_slice(&source.pixels);
        return;
    }
    let width = target.size[0].min(source.size[0]);
    let height = target.size[1].min(source.size[1]);
    for y in 0..height {
        let dest = y * target.size[0];
        let src = y * source.size[0];
        target.pixels[dest..dest + width].copy_from_slice(&source.pixels[src..src + width]);
    }
}

/// Straight-alpha color from `[r, g, b, a]`.
pub fn color(rgba: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Linear interpolation between two straight-alpha colors.
pub fn lerp_rgba(top: [u8; 4], bottom: [u8; 4], t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color32::from_rgba_unmultiplied(
        mix(top[0], bottom[0]),
        mix(top[1], bottom[1]),
        mix(top[2], bottom[2]),
        mix(top[3], bottom[3]),
    )
}

/// Source-over composition of premultiplied colors.
pub fn blend_over(dst: Color32, src: Color32) -> Color32 {
    let inv = 255 - src.a() as u16;
    let channel = |s: u8, d: u8| (s as u16 + (d as u16 * inv + 127) / 255).min(255) as u8;
    Color32::from_rgba_premultiplied(
        channel(src.r(), dst.r()),
        channel(src.g(), dst.g()),
        channel(src.b(), dst.b()),
        channel(src.a(), dst.a()),
    )
}

/// Blend `color` over every pixel whose center lies inside the rectangle.
pub fn fill_rect(image: &mut ColorImage, x: f32, y: f32, width: f32, height: f32, color: Color32) {
    let [image_w, image_h] = image.size;
    let Some((x0, x1)) = pixel_span(x, x + width, image_w) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(y, y + height, image_h) else {
        return;
    };
    for row in y0..y1 {
        let base = row * image_w;
        for pixel in &mut image.pixels[base + x0..base + x1] {
            *pixel = blend_over(*pixel, color);
        }
    }
}

/// Fill a closed polygon (even-odd rule) with a vertical gradient.
///
/// `top` applies to row 0 and `bottom` to the last row.
pub fn fill_polygon_gradient(
    image: &mut ColorImage,
    points: &[(f32, f32)],
    top: [u8; 4],
    bottom: [u8; 4],
) {
    let [width, height] = image.size;
    if points.len() < 3 || width == 0 || height == 0 {
        return;
    }
    let last_row = height.saturating_sub(1).max(1) as f32;
    let mut crossings: Vec<f32> = Vec::with_capacity(16);
    for row in 0..height {
        let scan_y = row as f32 + 0.5;
        crossings.clear();
        let mut previous = points[points.len() - 1];
        for &current in points {
            let (x0, y0) = previous;
            let (x1, y1) = current;
            if (y0 <= scan_y) != (y1 <= scan_y) {
                let t = (scan_y - y0) / (y1 - y0);
                crossings.push(x0 + t * (x1 - x0));
            }
            previous = current;
        }
        if crossings.len() < 2 {
            continue;
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        let fill = lerp_rgba(top, bottom, row as f32 / last_row);
        let base = row * width;
        for pair in crossings.chunks_exact(2) {
            let Some((start, end)) = pixel_span(pair[0], pair[1], width) else {
                continue;
            };
            for pixel in &mut image.pixels[base + start..base + end] {
                *pixel = blend_over(*pixel, fill);
            }
        }
    }
}

/// Pixels whose centers fall in `[from, to)`, clipped to `[0, limit)`.
fn pixel_span(from: f32, to: f32, limit: usize) -> Option<(usize, usize)> {
    if !from.is_finite() || !to.is_finite() {
        return None;
    }
    let start = (from - 0.5).ceil().max(0.0) as usize;
    let end = ((to - 0.5).ceil().max(0.0) as usize).min(limit);
    (start < end).then_some((start, end))
}
