//! Pointer gestures over the waveform, translated into locator and zoom edits.
//!
//! Positions arrive in local coordinates (fractions of the visible window)
//! and are converted to normalized space before they reach the track.

use serde::{Deserialize, Serialize};

use crate::track::{
    FactorUpdate, Locator, LocatorKind, LocatorUpdate, Track, UpdateOptions, ZoomRequest,
};

/// Positions closer than this are treated as the same point.
pub const MIN_LOOP_PERCENT: f64 = 0.001;

/// Pointer and wheel tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionOptions {
    /// Relative zoom change per scrolled point.
    #[serde(default = "default_wheel_sensitivity")]
    pub wheel_sensitivity: f64,
    /// Flip the wheel zoom direction.
    #[serde(default)]
    pub invert_wheel: bool,
    /// Restart playback while dragging a loop.
    #[serde(default = "default_true")]
    pub restart_on_drag: bool,
}

fn default_wheel_sensitivity() -> f64 {
    0.005
}

fn default_true() -> bool {
    true
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            wheel_sensitivity: default_wheel_sensitivity(),
            invert_wheel: false,
            restart_on_drag: true,
        }
    }
}

impl InteractionOptions {
    /// Clamp values loaded from disk into usable ranges.
    pub fn normalized(mut self) -> Self {
        self.wheel_sensitivity = if self.wheel_sensitivity.is_finite() {
            self.wheel_sensitivity.clamp(0.0001, 0.5)
        } else {
            default_wheel_sensitivity()
        };
        self
    }
}

fn same_point(a: f64, b: f64) -> bool {
    (a - b).abs() < MIN_LOOP_PERCENT
}

/// Loop spanning the press position and `local`, ordered; a point while the
/// two are indistinguishable.
pub fn dragged_loop(pressed_at: f64, local: f64) -> Locator {
    if pressed_at < local && !same_point(pressed_at, local) {
        return Locator::span(pressed_at, local);
    }
    if !same_point(local, pressed_at) {
        return Locator::span(local, pressed_at);
    }
    Locator::point(pressed_at)
}

/// Move whichever edge of `current` is nearer to `local`.
pub fn shifted_loop(local: f64, current: Locator) -> Locator {
    let middle = match current.end {
        Some(end) => (current.start + end) / 2.0,
        None => current.start,
    };
    if local < middle {
        Locator {
            start: local,
            end: Some(current.end.unwrap_or(current.start)),
        }
    } else {
        Locator {
            start: current.start,
            end: Some(local),
        }
    }
}

/// Zoom factor after a wheel step of `delta` units.
pub fn wheel_factor(factor: f64, delta: f64, sensitivity: f64) -> f64 {
    factor * (1.0 + delta * sensitivity)
}

/// Press/drag/release state for loop selection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerGesture {
    is_down: bool,
    pressed_at: f64,
    set_loop_on_press: bool,
}

impl PointerGesture {
    /// True between press and release.
    pub fn is_dragging(&self) -> bool {
        self.is_down
    }

    /// Start a loop at `local`, or move its nearer edge with `shift`.
    pub fn press(&mut self, track: &mut Track, local: f64, shift: bool) {
        let window = track.zoom_window();
        let current = track
            .locators()
            .loop_region()
            .map(|region| window.locator_to_local(region));
        self.is_down = true;
        self.pressed_at = local;
        self.set_loop_on_press = current.is_none_or(|region| !same_point(region.start, local));
        let next = match current {
            Some(region) if shift => shifted_loop(local, region),
            _ => Locator::point(local),
        };
        track.update_locators(
            LocatorKind::Loop,
            window.locator_to_normalized(next),
            UpdateOptions::default(),
        );
        track.draw();
    }

    /// Hover when idle; extend the loop while dragging.
    pub fn drag(&mut self, track: &mut Track, local: f64, shift: bool, options: &InteractionOptions) {
        if !self.is_down {
            track.hover_at(Some(local));
            track.draw();
            return;
        }
        let window = track.zoom_window();
        let pressed_at = self.pressed_at;
        let update = LocatorUpdate::map(move |current| {
            let current = window.locator_to_local(current?);
            let next = if shift {
                shifted_loop(local, current)
            } else {
                dragged_loop(pressed_at, local)
            };
            Some(window.locator_to_normalized(next))
        });
        let restart = UpdateOptions {
            restart_playback: options.restart_on_drag,
        };
        track.update_locators(LocatorKind::Loop, update, restart);
        track.draw();
    }

    /// Finish the gesture; a click on the existing loop start clears the loop.
    pub fn release(&mut self, track: &mut Track, local: f64) {
        if !self.set_loop_on_press && same_point(self.pressed_at, local) {
            track.update_locators(LocatorKind::Loop, None::<Locator>, UpdateOptions::default());
            track.draw();
        }
        self.is_down = false;
        self.set_loop_on_press = false;
    }

    /// Drop the hover marker; an in-progress selection is committed at `local`.
    pub fn leave(&mut self, track: &mut Track, local: f64) {
        track.hover_at(None);
        if self.is_down && self.set_loop_on_press {
            let window = track.zoom_window();
            let region = dragged_loop(self.pressed_at, local.max(0.0));
            track.update_locators(
                LocatorKind::Loop,
                window.locator_to_normalized(region),
                UpdateOptions::default(),
            );
            self.is_down = false;
            self.set_loop_on_press = false;
        }
        track.draw();
    }
}

/// Zoom around `local` by `delta` wheel units.
pub fn wheel_zoom(track: &mut Track, local: f64, delta: f64, options: &InteractionOptions) {
    if delta == 0.0 || !delta.is_finite() {
        return;
    }
    let delta = if options.invert_wheel { -delta } else { delta };
    let sensitivity = options.wheel_sensitivity;
    track.zoom(ZoomRequest::Focal {
        factor: FactorUpdate::map(move |factor| wheel_factor(factor, delta, sensitivity)),
        focus: local,
    });
    track.draw();
}
