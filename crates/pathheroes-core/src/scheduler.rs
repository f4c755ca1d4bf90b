//! Timer table driving every timed action of a battle.
//!
//! Repeating timers and one-shot deferred effects share one ordered table.
//! Keys sort in scan order, so sweeping the due keys once per tick yields a
//! stable execution order:
//!
//! 1. side-level timers (buff pulses), player before enemy
//! 2. the global transformation timer
//! 3. unit timers, player slots ascending then enemy slots ascending, and
//!    within one unit in [`AbilityKind`] order
//! 4. deferred impacts in creation order
//!
//! A repeating timer fires at most once per tick and is rescheduled to
//! `now + interval`. Missed periods are dropped, never caught up.
//!
//! # Example
//!
//! ```
//! use pathheroes_core::scheduler::{TimerKey, TimerTable};
//! use pathheroes_core::unit::{AbilityKind, Side, SlotRef};
//!
//! let mut timers = TimerTable::new();
//! let key = TimerKey::Unit { unit: SlotRef::new(Side::Player, 0), ability: AbilityKind::BasicStrike };
//! timers.schedule_repeating(key, 0, 1000);
//!
//! assert!(timers.due(999).is_empty());
//! assert_eq!(timers.due(1016), vec![key]);
//! assert!(timers.fire(key, 1016).is_some());
//! assert_eq!(timers.next_fire(key), Some(2016));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::unit::{AbilityKind, Side, SlotRef};

/// Timers owned by a side rather than a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SideTimer {
    /// Opens the side's buff window while an emitter lives.
    BuffPulse,
}

/// Identity of a timer, ordered by scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimerKey {
    /// Side-level timer.
    Side {
        /// Owning side
        side: Side,
        /// Timer kind
        kind: SideTimer,
    },
    /// One-shot transformation of every impostor.
    Transform,
    /// Ability cadence of one combatant.
    Unit {
        /// Owning slot
        unit: SlotRef,
        /// Ability driven by this timer
        ability: AbilityKind,
    },
    /// One-shot delayed effect.
    Deferred {
        /// Creation sequence number
        seq: u64,
    },
}

impl TimerKey {
    /// Returns the slot owning this timer, for unit timers.
    #[must_use]
    pub const fn unit(&self) -> Option<SlotRef> {
        match self {
            Self::Unit { unit, .. } => Some(*unit),
            _ => None,
        }
    }
}

/// Payload of a deferred timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeferredEffect {
    /// A launched projectile landing on `target`.
    Impact {
        /// Launching combatant
        source: SlotRef,
        /// Slot the projectile lands on
        target: SlotRef,
        /// Attack of the source at launch
        base_damage: f64,
        /// Ability multiplier
        multiplier: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Timer {
    next_fire: Millis,
    interval: Option<Millis>,
    effect: Option<DeferredEffect>,
}

/// A timer that fired this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firing {
    /// Key of the fired timer
    pub key: TimerKey,
    /// Payload, for deferred timers
    pub effect: Option<DeferredEffect>,
}

/// Ordered table of pending timers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerTable {
    timers: BTreeMap<TimerKey, Timer>,
    next_seq: u64,
}

impl TimerTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repeating timer whose first fire is `anchor + interval`.
    ///
    /// Replaces any timer already registered under `key`.
    pub fn schedule_repeating(&mut self, key: TimerKey, anchor: Millis, interval: Millis) {
        let interval = interval.max(1);
        self.timers.insert(
            key,
            Timer {
                next_fire: anchor.saturating_add(interval),
                interval: Some(interval),
                effect: None,
            },
        );
    }

    /// Registers a one-shot timer firing at `at`.
    pub fn schedule_once(&mut self, key: TimerKey, at: Millis) {
        self.timers.insert(
            key,
            Timer {
                next_fire: at,
                interval: None,
                effect: None,
            },
        );
    }

    /// Registers a deferred effect landing at `at` and returns its key.
    pub fn defer(&mut self, at: Millis, effect: DeferredEffect) -> TimerKey {
        let key = TimerKey::Deferred { seq: self.next_seq };
        self.next_seq += 1;
        self.timers.insert(
            key,
            Timer {
                next_fire: at,
                interval: None,
                effect: Some(effect),
            },
        );
        key
    }

    /// Returns when `key` fires next, if it is scheduled.
    #[must_use]
    pub fn next_fire(&self, key: TimerKey) -> Option<Millis> {
        self.timers.get(&key).map(|timer| timer.next_fire)
    }

    /// Returns every key due at `now`, in scan order.
    ///
    /// The list is a snapshot: timers added while it is processed are not
    /// part of it.
    #[must_use]
    pub fn due(&self, now: Millis) -> Vec<TimerKey> {
        self.timers
            .iter()
            .filter(|(_, timer)| timer.next_fire <= now)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Fires `key` if it is still scheduled and due.
    ///
    /// Repeating timers move to `now + interval`; one-shot timers are
    /// removed. Returns `None` if the timer was cancelled or re-anchored
    /// since the due list was taken.
    pub fn fire(&mut self, key: TimerKey, now: Millis) -> Option<Firing> {
        let timer = self.timers.get_mut(&key)?;
        if timer.next_fire > now {
            return None;
        }
        let interval = timer.interval;
        match interval {
            Some(interval) => {
                timer.next_fire = now.saturating_add(interval);
                Some(Firing { key, effect: None })
            }
            None => self
                .timers
                .remove(&key)
                .map(|timer| Firing { key, effect: timer.effect }),
        }
    }

    /// Removes every timer owned by `unit`.
    ///
    /// Deferred impacts already launched by the unit stay in flight.
    pub fn cancel_unit(&mut self, unit: SlotRef) {
        self.timers.retain(|key, _| key.unit() != Some(unit));
    }

    /// Removes a single timer.
    pub fn cancel(&mut self, key: TimerKey) {
        self.timers.remove(&key);
    }

    /// Removes every timer, deferred effects included.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Returns the number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Returns true if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Returns true if `key` is scheduled.
    #[must_use]
    pub fn contains(&self, key: TimerKey) -> bool {
        self.timers.contains_key(&key)
    }
}
