use std::cell::Cell;

use tracing::debug;

#[cfg(target_arch = "wasm32")]
mod observer;
#[cfg(target_arch = "wasm32")]
pub use observer::FeaturedEventsTracker;

/// Telemetry event captured when the featured events section first becomes
/// visible. No payload.
pub const FEATURED_EVENTS_VIEWED: &str = "featured_events_viewed";

/// Share of the section that must be in the viewport before the gate fires.
pub const VISIBILITY_THRESHOLD: f64 = 0.1;

/// Single-fire gate over visibility changes: reports the first qualifying
/// entry and swallows everything after it for the rest of the mount
/// lifetime, however often the section re-enters the viewport.
#[derive(Debug, Default)]
pub struct VisibilityGate {
    captured: Cell<bool>,
}

impl VisibilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once, on the first intersecting entry.
    pub fn on_intersection(&self, is_intersecting: bool) -> bool {
        if !is_intersecting || self.captured.get() {
            return false;
        }

        self.captured.set(true);
        debug!(task = "capture section view", event = FEATURED_EVENTS_VIEWED);
        true
    }
}
