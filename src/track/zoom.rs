//! Zoom window transitions.
//!
//! Every transition is a pure function of the current [`ZoomState`], the
//! current zoom locator and a [`ZoomRequest`]; the track applies the outcome
//! and invalidates its render caches.

use std::fmt;

use super::coords::ZoomWindow;
use super::locators::Locator;

/// Smallest visible fraction of the buffer.
pub const DEFAULT_MIN_ZOOM_FACTOR: f64 = 1e-5;

/// Zoom factor plus the history used to anchor focal zooms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomState {
    /// Visible fraction of the buffer; 1 means fully zoomed out.
    pub factor: f64,
    /// Factor before the most recent transition.
    pub prev_factor: f64,
    /// Local pointer position used as the anchor of the last focal zoom.
    pub focus: f64,
    /// Window start before the most recent transition.
    pub prev_start: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            factor: 1.0,
            prev_factor: 1.0,
            focus: 0.0,
            prev_start: 0.0,
        }
    }
}

impl ZoomState {
    /// Window described by this state and the zoom locator.
    pub fn window(&self, zoom: Option<Locator>) -> ZoomWindow {
        ZoomWindow::from_locator(zoom, self.factor)
    }

    /// State matching a zoom locator set directly, keeping the history.
    pub fn synced_to(&self, zoom: Option<Locator>) -> Self {
        let factor = zoom.map_or(1.0, |window| window.end_or(1.0) - window.start);
        Self {
            factor: if factor > 0.0 { factor.min(1.0) } else { 1.0 },
            prev_factor: self.factor,
            focus: self.focus,
            prev_start: self.prev_start,
        }
    }
}

/// New zoom factor, either absolute or derived from the previous one.
pub enum FactorUpdate {
    /// Use this factor.
    Set(f64),
    /// Compute the factor from the previous one.
    Map(Box<dyn FnOnce(f64) -> f64>),
}

impl FactorUpdate {
    /// Wrap a closure over the previous factor.
    pub fn map(update: impl FnOnce(f64) -> f64 + 'static) -> Self {
        Self::Map(Box::new(update))
    }

    fn resolve(self, previous: f64) -> f64 {
        match self {
            Self::Set(value) => value,
            Self::Map(update) => update(previous),
        }
    }
}

impl From<f64> for FactorUpdate {
    fn from(value: f64) -> Self {
        Self::Set(value)
    }
}

impl fmt::Debug for FactorUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(value) => f.debug_tuple("Set").field(value).finish(),
            Self::Map(_) => f.write_str("Map(..)"),
        }
    }
}

/// The three mutually exclusive zoom modes.
#[derive(Debug)]
pub enum ZoomRequest {
    /// Zoom to `factor`, keeping the position under local `focus` in place.
    Focal {
        /// Target factor.
        factor: FactorUpdate,
        /// Local anchor position in `[0, 1]`.
        focus: f64,
    },
    /// Zoom to a local span of the current window; consumes the loop.
    Region {
        /// Local start.
        start: f64,
        /// Local end; the window edge when absent.
        end: Option<f64>,
    },
    /// Back to the full buffer.
    Reset,
}

/// Result of a zoom transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomOutcome {
    /// Next zoom state.
    pub state: ZoomState,
    /// Next zoom locator; `None` exactly when fully zoomed out.
    pub locator: Option<Locator>,
    /// True when the loop locator must be cleared.
    pub clears_loop: bool,
}

/// Compute the zoom transition for `request`.
pub fn apply(
    state: ZoomState,
    locator: Option<Locator>,
    request: ZoomRequest,
    min_factor: f64,
) -> ZoomOutcome {
    let min_factor = min_factor.clamp(f64::MIN_POSITIVE, 1.0);
    let current = state.window(locator);
    match request {
        ZoomRequest::Reset => ZoomOutcome {
            state: ZoomState::default(),
            locator: None,
            clears_loop: false,
        },
        ZoomRequest::Focal { factor, focus } => {
            let focus = if focus.is_finite() {
                focus.clamp(0.0, 1.0)
            } else {
                0.0
            };
            let requested = factor.resolve(state.factor);
            let target = if requested.is_finite() {
                requested.clamp(min_factor, 1.0)
            } else {
                state.factor
            };
            let start = (current.start + (state.factor - target) * focus).max(0.0);
            let end = (start + target).min(1.0);
            let history = ZoomState {
                factor: state.factor,
                prev_factor: state.factor,
                focus,
                prev_start: current.start,
            };
            settle(history, start, end, min_factor, false)
        }
        ZoomRequest::Region { start, end } => {
            let span = current.locator_to_normalized(Locator {
                start,
                end: Some(end.unwrap_or(1.0)),
            });
            let span = Locator::span(span.start, span.end_or(current.end()));
            let history = ZoomState {
                factor: state.factor,
                prev_factor: state.factor,
                focus: state.focus,
                prev_start: current.start,
            };
            settle(history, span.start, span.end_or(1.0), min_factor, true)
        }
    }
}

/// Turn a normalized `[start, end)` window into an outcome, enforcing bounds.
fn settle(history: ZoomState, start: f64, end: f64, min_factor: f64, clears_loop: bool) -> ZoomOutcome {
    let mut start = start.clamp(0.0, 1.0);
    let end = end.clamp(start, 1.0);
    if end - start < min_factor {
        start = (end - min_factor).max(0.0);
    }
    let end = end.max((start + min_factor).min(1.0));
    let factor = end - start;
    if factor >= 1.0 {
        return ZoomOutcome {
            state: ZoomState {
                factor: 1.0,
                ..history
            },
            locator: None,
            clears_loop,
        };
    }
    ZoomOutcome {
        state: ZoomState { factor, ..history },
        locator: Some(Locator {
            start,
            end: Some(end),
        }),
        clears_loop,
    }
}
