//! Simulated battle clock.
//!
//! All scheduling in the engine is expressed as absolute millisecond
//! timestamps on this clock. The clock only moves forward, one fixed tick at
//! a time.

use serde::{Deserialize, Serialize};

/// Milliseconds on the simulated clock.
pub type Millis = u64;

/// Default tick length, roughly 60 Hz.
pub const DEFAULT_TICK_MS: Millis = 16;

/// Monotonic simulated time source advanced once per tick.
///
/// # Example
///
/// ```
/// use pathheroes_core::clock::Clock;
///
/// let mut clock = Clock::new(0, 16);
/// assert_eq!(clock.advance(), 16);
/// assert_eq!(clock.advance(), 32);
/// assert_eq!(clock.ticks(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    now: Millis,
    tick_ms: Millis,
    ticks: u64,
}

impl Clock {
    /// Creates a clock reading `start`, advancing `tick_ms` per tick.
    ///
    /// A zero tick length is bumped to 1 ms so the clock always moves.
    #[must_use]
    pub fn new(start: Millis, tick_ms: Millis) -> Self {
        Self {
            now: start,
            tick_ms: tick_ms.max(1),
            ticks: 0,
        }
    }

    /// Returns the current time.
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Returns the tick length.
    #[must_use]
    pub const fn tick_ms(&self) -> Millis {
        self.tick_ms
    }

    /// Returns the number of ticks advanced since creation or the last reset.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances one tick and returns the new time.
    pub fn advance(&mut self) -> Millis {
        self.now = self.now.saturating_add(self.tick_ms);
        self.ticks += 1;
        self.now
    }

    /// Moves the clock to `start` and clears the tick counter.
    ///
    /// Only used when a battle leaves setup, so time never runs backwards
    /// while timers are live.
    pub(crate) fn reset_to(&mut self, start: Millis) {
        self.now = start;
        self.ticks = 0;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(0, DEFAULT_TICK_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_by_tick_length() {
        let mut clock = Clock::new(100, 10);
        assert_eq!(clock.now(), 100);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), 120);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn zero_tick_is_bumped() {
        let mut clock = Clock::new(0, 0);
        assert_eq!(clock.tick_ms(), 1);
        assert_eq!(clock.advance(), 1);
    }

    #[test]
    fn reset_clears_ticks() {
        let mut clock = Clock::default();
        clock.advance();
        clock.reset_to(500);
        assert_eq!(clock.now(), 500);
        assert_eq!(clock.ticks(), 0);
    }
}
