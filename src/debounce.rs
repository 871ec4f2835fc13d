// Trailing-edge rate limiter for bursty input

use std::time::{Duration, Instant};

/// Default quiet window for search input
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

/// Holds the latest pushed value until the input has been quiet for `window`
///
/// Time is passed in explicitly so callers (and tests) own the clock.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    /// Record a new value at `now`, replacing any pending one and restarting the window
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Release the pending value if the window has elapsed since the last push
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let settled = matches!(
            &self.pending,
            Some((_, at)) if now.saturating_duration_since(*at) >= self.window
        );
        if settled { self.flush() } else { None }
    }

    /// Release the pending value regardless of the window
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
