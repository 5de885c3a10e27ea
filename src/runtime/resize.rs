//! Collapses bursts of resize notifications into one recalculation.
//!
//! Terminals emit a resize event for every intermediate size while the
//! window is dragged. The debouncer keeps only the latest size and releases
//! it once no new event has arrived for the configured quiet period.
//!
//! Time is passed in explicitly so callers (and tests) control the clock.

use std::time::{Duration, Instant};

use crate::geometry::Size;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    window: Duration,
    pending: Option<Size>,
    last_event: Option<Instant>,
    coalesced: u64,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ResizeDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            last_event: None,
            coalesced: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a resize; the latest size wins.
    pub fn push(&mut self, size: Size, now: Instant) {
        if self.pending.replace(size).is_some() {
            self.coalesced = self.coalesced.saturating_add(1);
        }
        self.last_event = Some(now);
    }

    /// Release the pending size if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Size> {
        let last = self.last_event?;
        if now.saturating_duration_since(last) < self.window {
            return None;
        }
        self.flush()
    }

    /// Release the pending size immediately.
    pub fn flush(&mut self) -> Option<Size> {
        self.last_event = None;
        self.pending.take()
    }

    /// When the pending size becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_event.map(|last| last + self.window)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Resize events absorbed into a later one.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
