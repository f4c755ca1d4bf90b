//! Per-side damage buff windows.

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::unit::Side;

/// Tracks one expiring damage multiplier window per side.
///
/// Re-opening a window overwrites the expiry with the newer one.
///
/// # Example
///
/// ```
/// use pathheroes_core::buff::BuffTracker;
/// use pathheroes_core::unit::Side;
///
/// let mut buffs = BuffTracker::new(3.0);
/// buffs.open(Side::Player, 3000, 2000);
/// assert_eq!(buffs.multiplier_for(Side::Player, 4999), 3.0);
/// assert_eq!(buffs.multiplier_for(Side::Player, 5000), 1.0);
/// assert_eq!(buffs.multiplier_for(Side::Enemy, 4000), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuffTracker {
    until: [Option<Millis>; 2],
    multiplier: f64,
}

impl BuffTracker {
    /// Creates a tracker with both windows closed.
    #[must_use]
    pub const fn new(multiplier: f64) -> Self {
        Self {
            until: [None; 2],
            multiplier,
        }
    }

    /// Opens `side`'s window until `now + duration` and returns the expiry.
    pub fn open(&mut self, side: Side, now: Millis, duration: Millis) -> Millis {
        let until = now.saturating_add(duration);
        self.until[side.index()] = Some(until);
        until
    }

    /// Returns true while `side`'s window is open.
    #[must_use]
    pub fn is_active(&self, side: Side, now: Millis) -> bool {
        self.until[side.index()].is_some_and(|until| now < until)
    }

    /// Returns the expiry of `side`'s latest window.
    #[must_use]
    pub fn active_until(&self, side: Side) -> Option<Millis> {
        self.until[side.index()]
    }

    /// Returns the damage multiplier currently applying to `side`.
    #[must_use]
    pub fn multiplier_for(&self, side: Side, now: Millis) -> f64 {
        if self.is_active(side, now) {
            self.multiplier
        } else {
            1.0
        }
    }

    /// Closes both windows.
    pub fn clear(&mut self) {
        self.until = [None; 2];
    }
}
