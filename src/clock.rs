//! Monotonic time sources
//!
//! Interval arithmetic is only well defined on a clock that never jumps, so the
//! capture engine is fed from a monotonic high-resolution source rather than
//! calendar time.

use crate::types::Millis;
use std::cell::Cell;
use std::time::Instant;

/// A monotonic, non-decreasing millisecond clock
pub trait Clock {
    /// Current reading in milliseconds since the clock's origin
    fn now_ms(&self) -> Millis;
}

/// Clock backed by [`Instant`], with its origin at construction time
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic replay.
///
/// Attempts to move it backwards are ignored so that readings stay non-decreasing.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock forward by `delta` milliseconds
    pub fn advance(&self, delta: Millis) {
        if delta > 0.0 {
            self.now.set(self.now.get() + delta);
        }
    }

    /// Jump to an absolute reading, if it is not in the past
    pub fn set(&self, now: Millis) {
        if now >= self.now.get() {
            self.now.set(now);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(first >= 0.0);
        assert!(second >= first);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(100.0);
        clock.advance(25.5);
        assert_eq!(clock.now_ms(), 125.5);
    }

    #[test]
    fn test_manual_clock_ignores_backwards_moves() {
        let clock = ManualClock::new(50.0);
        clock.set(10.0);
        clock.advance(-5.0);
        assert_eq!(clock.now_ms(), 50.0);

        clock.set(75.0);
        assert_eq!(clock.now_ms(), 75.0);
    }
}
