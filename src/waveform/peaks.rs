//! Per-column peak memoization for the visible window.

use std::sync::Arc;

use crate::track::ZoomWindow;

/// Memoized positive and negative peaks per pixel column.
///
/// Column `x` covers samples `[ceil(x * spp + offset), ceil((x + 1) * spp + offset))`
/// where `spp` is the number of samples per pixel for the current window and
/// `offset` is the index of the first visible sample. The cache is cleared
/// and its epoch bumped whenever samples, width or window change.
#[derive(Debug, Default)]
pub struct PeakCache {
    samples: Arc<[f32]>,
    width: usize,
    window: ZoomWindow,
    samples_per_pixel: f64,
    offset: f64,
    positive: Vec<Option<f32>>,
    negative: Vec<Option<f32>>,
    epoch: u64,
}

impl PeakCache {
    /// Empty cache with no samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sample set and invalidate.
    pub fn set_samples(&mut self, samples: Arc<[f32]>) {
        self.samples = samples;
        self.recompute();
    }

    /// Recompute the bucket layout for a new width or window and invalidate.
    pub fn configure(&mut self, width: usize, window: ZoomWindow) {
        self.width = width;
        self.window = window;
        self.recompute();
    }

    /// Drop every memoized column.
    pub fn invalidate(&mut self) {
        self.positive.clear();
        self.positive.resize(self.width, None);
        self.negative.clear();
        self.negative.resize(self.width, None);
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Counter bumped on each invalidation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Samples covered by one pixel column.
    pub fn samples_per_pixel(&self) -> f64 {
        self.samples_per_pixel
    }

    /// Column count the cache is laid out for.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Largest sample `>= 0` (positive) or smallest sample `<= 0` in column `x`.
    ///
    /// Empty buckets and columns outside the layout yield `0.0`.
    pub fn peak(&mut self, x: usize, positive: bool) -> f32 {
        if x >= self.width {
            return self.scan(x, positive);
        }
        let slot = if positive {
            &self.positive[x]
        } else {
            &self.negative[x]
        };
        if let Some(value) = *slot {
            return value;
        }
        let value = self.scan(x, positive);
        let slots = if positive {
            &mut self.positive
        } else {
            &mut self.negative
        };
        slots[x] = Some(value);
        value
    }

    /// True when column `x` has a memoized value for `positive`.
    pub fn is_cached(&self, x: usize, positive: bool) -> bool {
        let slots = if positive { &self.positive } else { &self.negative };
        slots.get(x).is_some_and(Option::is_some)
    }

    fn recompute(&mut self) {
        self.samples_per_pixel = if self.width == 0 {
            0.0
        } else {
            self.samples.len() as f64 * self.window.factor / self.width as f64
        };
        self.offset = self.samples.len() as f64 * self.window.start;
        self.invalidate();
    }

    fn bucket(&self, x: usize) -> (usize, usize) {
        let len = self.samples.len();
        let start = (x as f64 * self.samples_per_pixel + self.offset).ceil();
        let end = ((x + 1) as f64 * self.samples_per_pixel + self.offset).ceil();
        let clamp = |value: f64| {
            if value <= 0.0 {
                0
            } else {
                (value as usize).min(len)
            }
        };
        (clamp(start), clamp(end))
    }

    fn scan(&self, x: usize, positive: bool) -> f32 {
        let (start, end) = self.bucket(x);
        let Some(bucket) = self.samples.get(start..end) else {
            return 0.0;
        };
        if positive {
            bucket.iter().copied().filter(|s| *s >= 0.0).fold(0.0, f32::max)
        } else {
            bucket.iter().copied().filter(|s| *s <= 0.0).fold(0.0, f32::min)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(samples: Vec<f32>, width: usize, window: ZoomWindow) -> PeakCache {
        let mut cache = PeakCache::new();
        cache.set_samples(Arc::from(samples));
        cache.configure(width, window);
        cache
    }

    #[test]
    fn peaks_follow_column_buckets() {
        let samples = vec![0.1, -0.4, 0.9, -0.2, 0.3, 0.2, -0.8, 0.0];
        let mut cache = cache_with(samples, 2, ZoomWindow::IDENTITY);
        assert_eq!(cache.samples_per_pixel(), 4.0);
        assert_eq!(cache.peak(0, true), 0.9);
        assert_eq!(cache.peak(0, false), -0.4);
        assert_eq!(cache.peak(1, true), 0.3);
        assert_eq!(cache.peak(1, false), -0.8);
    }

    #[test]
    fn empty_buckets_yield_zero() {
        let mut cache = cache_with(vec![0.5, -0.5], 8, ZoomWindow::IDENTITY);
        assert_eq!(cache.peak(1, true), 0.0);
        assert_eq!(cache.peak(1, false), 0.0);
        assert_eq!(cache.peak(100, true), 0.0);

        let mut only_positive = cache_with(vec![0.2, 0.6], 1, ZoomWindow::IDENTITY);
        assert_eq!(only_positive.peak(0, false), 0.0);
    }

    #[test]
    fn zoom_window_offsets_buckets() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32 / 10.0).collect();
        let window = ZoomWindow {
            start: 0.5,
            factor: 0.5,
        };
        let mut cache = cache_with(samples, 5, window);
        assert_eq!(cache.samples_per_pixel(), 1.0);
        assert_eq!(cache.peak(0, true), 0.5);
        assert_eq!(cache.peak(4, true), 0.9);
    }

    #[test]
    fn memoized_values_survive_until_invalidated() {
        let mut cache = cache_with(vec![0.25; 16], 4, ZoomWindow::IDENTITY);
        let epoch = cache.epoch();
        assert!(!cache.is_cached(2, true));
        let first = cache.peak(2, true);
        assert!(cache.is_cached(2, true));
        assert_eq!(cache.peak(2, true), first);

        cache.set_samples(Arc::from(vec![0.75; 16]));
        assert!(!cache.is_cached(2, true));
        assert!(cache.epoch() > epoch);
        assert_eq!(cache.peak(2, true), 0.75);
    }
}
