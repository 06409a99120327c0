//! Last-value-wins throttles for high-rate input
//!
//! A `Coalescer` holds at most one pending value. The first offer opens a
//! window; later offers inside the window replace the pending value, nothing
//! is queued or replayed. The latest value is released on the first poll at
//! least `interval_ms` after the window opened.

#[derive(Debug, Clone)]
pub struct Coalescer<T> {
    interval_ms: u64,
    window_start_ms: u64,
    pending: Option<T>,
}

impl<T> Coalescer<T> {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            window_start_ms: 0,
            pending: None,
        }
    }

    /// Replace whatever is pending
    pub fn offer(&mut self, value: T, now_ms: u64) {
        if self.pending.is_none() {
            self.window_start_ms = now_ms;
        }
        self.pending = Some(value);
    }

    /// Release the pending value once its window has elapsed
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        if self.pending.is_some() && now_ms.saturating_sub(self.window_start_ms) >= self.interval_ms {
            self.pending.take()
        } else {
            None
        }
    }

    /// Release unconditionally (gesture end)
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Drop the pending value (gesture abandoned)
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
