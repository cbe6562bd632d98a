//! Timeline markers keyed by what they mark.

/// A `{start, end?}` pair on the timeline, in local or normalized space.
///
/// An absent `end` marks a point (hover, open-ended loop).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Locator {
    /// First position, always `<= end` once normalized.
    pub start: f64,
    /// Optional second position.
    pub end: Option<f64>,
}

impl Locator {
    /// Marker without an end.
    pub fn point(start: f64) -> Self {
        Self { start, end: None }
    }

    /// Span between two positions, ordered and clamped to `[0, 1]`.
    pub fn span(a: f64, b: f64) -> Self {
        Self {
            start: a,
            end: Some(b),
        }
        .normalized()
    }

    /// Clamp both ends to `[0, 1]` and swap them when reversed.
    pub fn normalized(self) -> Self {
        let start = clamp_unit(self.start);
        match self.end.map(clamp_unit) {
            Some(end) if end < start => Self {
                start: end,
                end: Some(start),
            },
            end => Self { start, end },
        }
    }

    /// End position, or `fallback` when open-ended.
    pub fn end_or(&self, fallback: f64) -> f64 {
        self.end.unwrap_or(fallback)
    }

    /// Width of the span, zero for points.
    pub fn width(&self) -> f64 {
        self.end.map_or(0.0, |end| (end - self.start).max(0.0))
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Which marker a locator update targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocatorKind {
    /// Active loop region; open-ended when `end` is absent.
    Loop,
    /// Transient pointer marker.
    Hover,
    /// Visible window.
    Zoom,
    /// Loop region replaced by the most recent loop update.
    PrevLoop,
}

impl LocatorKind {
    fn slot(self) -> usize {
        match self {
            Self::Loop => 0,
            Self::Hover => 1,
            Self::Zoom => 2,
            Self::PrevLoop => 3,
        }
    }
}

/// Enum-keyed map from [`LocatorKind`] to an optional [`Locator`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Locators {
    slots: [Option<Locator>; 4],
}

impl Locators {
    /// Current value for `kind`.
    pub fn get(&self, kind: LocatorKind) -> Option<Locator> {
        self.slots[kind.slot()]
    }

    /// Replace the value for `kind`, returning the previous one.
    pub fn replace(&mut self, kind: LocatorKind, value: Option<Locator>) -> Option<Locator> {
        std::mem::replace(&mut self.slots[kind.slot()], value)
    }

    /// Shorthand for the loop locator.
    pub fn loop_region(&self) -> Option<Locator> {
        self.get(LocatorKind::Loop)
    }

    /// Shorthand for the hover locator.
    pub fn hover(&self) -> Option<Locator> {
        self.get(LocatorKind::Hover)
    }

    /// Shorthand for the zoom window locator.
    pub fn zoom(&self) -> Option<Locator> {
        self.get(LocatorKind::Zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_orders_reversed_positions() {
        let locator = Locator::span(0.7, 0.3);
        assert_eq!(locator.start, 0.3);
        assert_eq!(locator.end, Some(0.7));
    }

    #[test]
    fn normalized_clamps_out_of_range_values() {
        let locator = Locator {
            start: -0.2,
            end: Some(1.4),
        }
        .normalized();
        assert_eq!(locator, Locator::span(0.0, 1.0));
        assert_eq!(Locator::point(f64::NAN).normalized().start, 0.0);
    }

    #[test]
    fn open_ended_locator_stays_open() {
        let locator = Locator::point(0.4).normalized();
        assert_eq!(locator.end, None);
        assert_eq!(locator.end_or(1.0), 1.0);
        assert_eq!(locator.width(), 0.0);
    }

    #[test]
    fn replace_returns_previous_value() {
        let mut locators = Locators::default();
        assert_eq!(locators.replace(LocatorKind::Loop, Some(Locator::point(0.1))), None);
        let previous = locators.replace(LocatorKind::Loop, Some(Locator::span(0.2, 0.4)));
        assert_eq!(previous, Some(Locator::point(0.1)));
        assert_eq!(locators.loop_region(), Some(Locator::span(0.2, 0.4)));
        assert_eq!(locators.hover(), None);
    }
}
