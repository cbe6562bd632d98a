//! Local (visible window) to normalized (whole buffer) coordinate mapping.

use super::locators::Locator;

/// Visible window over the normalized timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomWindow {
    /// Normalized position of the left edge.
    pub start: f64,
    /// Visible fraction of the buffer, in `(0, 1]`.
    pub factor: f64,
}

impl Default for ZoomWindow {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomWindow {
    /// Fully zoomed out.
    pub const IDENTITY: Self = Self {
        start: 0.0,
        factor: 1.0,
    };

    /// Window covering `locator` (open end runs to the buffer end).
    pub fn from_locator(locator: Option<Locator>, factor: f64) -> Self {
        Self {
            start: locator.map_or(0.0, |zoom| zoom.start),
            factor,
        }
    }

    /// Normalized position of the right edge.
    pub fn end(&self) -> f64 {
        self.start + self.factor
    }

    /// Map a local position into normalized space.
    pub fn to_normalized(&self, local: f64) -> f64 {
        self.start + local * self.factor
    }

    /// Map a normalized position into local space.
    pub fn to_local(&self, normalized: f64) -> f64 {
        if self.factor <= 0.0 {
            return 0.0;
        }
        (normalized - self.start) / self.factor
    }

    /// Map both ends of a local locator; an absent end stays absent.
    pub fn locator_to_normalized(&self, locator: Locator) -> Locator {
        Locator {
            start: self.to_normalized(locator.start),
            end: locator.end.map(|end| self.to_normalized(end)),
        }
    }

    /// Map both ends of a normalized locator; an absent end stays absent.
    pub fn locator_to_local(&self, locator: Locator) -> Locator {
        Locator {
            start: self.to_local(locator.start),
            end: locator.end.map(|end| self.to_local(end)),
        }
    }
}
