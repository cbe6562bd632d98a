use tracing::debug;

use super::zoom::{self, ZoomRequest};
use super::{Locator, LocatorKind, LocatorUpdate, Track, UpdateOptions};

impl Track {
    /// Replace the locator for `kind`.
    ///
    /// Values are clamped and ordered before they are stored. A loop update
    /// moves the old loop into [`LocatorKind::PrevLoop`] and a non-empty loop
    /// clears the hover marker; with `restart_playback` a playing loop
    /// restarts with the new bounds. A zoom update re-derives the zoom factor.
    pub fn update_locators(
        &mut self,
        kind: LocatorKind,
        update: impl Into<LocatorUpdate>,
        options: UpdateOptions,
    ) {
        let previous = self.locators.get(kind);
        let next = update.into().resolve(previous).map(Locator::normalized);
        match kind {
            LocatorKind::Loop => {
                self.locators.replace(LocatorKind::Loop, next);
                self.locators.replace(LocatorKind::PrevLoop, previous);
                if next.is_some() {
                    self.locators.replace(LocatorKind::Hover, None);
                }
                debug!(?next, "Loop updated");
                if options.restart_playback && self.is_playing() {
                    self.play();
                }
            }
            LocatorKind::Zoom => {
                let state = self.zoom_state.synced_to(next);
                let locator = if state.factor >= 1.0 { None } else { next };
                self.zoom_state = state;
                self.locators.replace(LocatorKind::Zoom, locator);
                self.sync_canvas_window();
            }
            LocatorKind::Hover | LocatorKind::PrevLoop => {
                self.locators.replace(kind, next);
            }
        }
    }

    /// Apply a focal, region or reset zoom.
    pub fn zoom(&mut self, request: ZoomRequest) {
        let outcome = zoom::apply(
            self.zoom_state,
            self.locators.zoom(),
            request,
            self.settings.min_zoom_factor,
        );
        self.zoom_state = outcome.state;
        self.locators.replace(LocatorKind::Zoom, outcome.locator);
        if outcome.clears_loop && self.locators.loop_region().is_some() {
            self.update_locators(LocatorKind::Loop, None::<Locator>, UpdateOptions::default());
        }
        debug!(factor = outcome.state.factor, window = ?outcome.locator, "Zoom changed");
        self.sync_canvas_window();
    }

    /// Zoom onto the current loop; the loop is consumed.
    pub fn zoom_to_loop(&mut self) {
        let Some(region) = self.locators.loop_region() else {
            return;
        };
        if region.end.is_none() {
            return;
        }
        let local = self.zoom_window().locator_to_local(region);
        self.zoom(ZoomRequest::Region {
            start: local.start,
            end: local.end,
        });
    }

    /// Zoom out fully; the window that was visible becomes the loop.
    pub fn zoom_out_to_loop(&mut self) {
        let visible = self.locators.zoom();
        self.zoom(ZoomRequest::Reset);
        if visible.is_some() {
            self.update_locators(LocatorKind::Loop, visible, UpdateOptions::RESTART);
        }
    }

    /// Toggle the loop: an active loop is switched off (and remembered as the
    /// previous loop), otherwise the previous loop comes back. Playing audio
    /// restarts with the new bounds.
    pub fn restore_previous_loop(&mut self) {
        let next = match self.locators.loop_region() {
            Some(_) => None,
            None => self.locators.get(LocatorKind::PrevLoop),
        };
        self.update_locators(LocatorKind::Loop, next, UpdateOptions::RESTART);
    }

    /// Set the hover marker from a local pointer position.
    pub fn hover_at(&mut self, local: Option<f64>) {
        let window = self.zoom_window();
        let hover = local.map(|local| Locator::point(window.to_normalized(local)));
        self.update_locators(LocatorKind::Hover, hover, UpdateOptions::default());
    }
}
