//! Plain-data outputs of a running battle.
//!
//! The engine never draws anything. A renderer or trace writer consumes two
//! kinds of output:
//! - [`BattleEvent`]: cues drained after each tick (strikes, deaths, heals,
//!   buff windows, projectiles, transformations, summons, resolution)
//! - [`BattleSnapshot`]: per-slot view of the current state
//!
//! # Example
//!
//! ```
//! use pathheroes_core::output::{BattleEvent, EventLog, StrikeKind};
//! use pathheroes_core::unit::{Side, SlotRef};
//!
//! let mut log = EventLog::new();
//! log.push(BattleEvent::Strike {
//!     at: 1000,
//!     source: SlotRef::new(Side::Player, 0),
//!     target: SlotRef::new(Side::Enemy, 0),
//!     kind: StrikeKind::Basic,
//!     damage: 10.0,
//! });
//!
//! let events = log.take();
//! assert_eq!(events.len(), 1);
//! assert!(log.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::roster::{Rosters, ROSTER_SIZE};
use crate::state::{BattlePhase, Outcome};
use crate::unit::{Archetype, Side, SlotRef};

// =============================================================================
// Events
// =============================================================================

/// Flavour of a damaging hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeKind {
    /// Regular attack
    Basic,
    /// Periodic double-damage hit
    Bonus,
    /// Landed heavy projectile
    Heavy,
    /// One hit of an all-target strike
    AllTarget,
    /// One hit of a multi-hit basic strike
    MultiHit,
    /// Fixed-damage hit
    Scatter,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// Damage was applied.
    Strike {
        /// Time of the hit
        at: Millis,
        /// Attacker
        source: SlotRef,
        /// Defender
        target: SlotRef,
        /// Hit flavour
        kind: StrikeKind,
        /// Damage after multipliers
        damage: f64,
    },
    /// Damage was discarded by an invulnerability window.
    Shielded {
        /// Time of the hit
        at: Millis,
        /// Attacker
        source: SlotRef,
        /// Shielded defender
        target: SlotRef,
    },
    /// A combatant died.
    Defeated {
        /// Time of death
        at: Millis,
        /// Dead combatant
        unit: SlotRef,
        /// Killer
        by: SlotRef,
    },
    /// A self-heal roll succeeded.
    Healed {
        /// Time of the heal
        at: Millis,
        /// Healed combatant
        unit: SlotRef,
        /// Health restored
        amount: f64,
    },
    /// A side's buff window opened.
    BuffOpened {
        /// Time of the pulse
        at: Millis,
        /// Buffed side
        side: Side,
        /// Window expiry
        until: Millis,
    },
    /// A heavy projectile was launched.
    MeteorLaunched {
        /// Launch time
        at: Millis,
        /// Launcher
        source: SlotRef,
        /// Slot it will land on
        target: SlotRef,
        /// Impact time
        lands_at: Millis,
    },
    /// An impostor copied its opposing same-slot unit.
    Transformed {
        /// Time of the transformation
        at: Millis,
        /// Transformed combatant
        unit: SlotRef,
        /// Identifier of the copied unit
        into: String,
    },
    /// A unit was inserted mid-battle.
    Summoned {
        /// Insertion time
        at: Millis,
        /// New unit
        unit: SlotRef,
        /// Summoner or killer that caused the insertion
        by: SlotRef,
    },
    /// The battle ended.
    Resolved {
        /// Resolution time
        at: Millis,
        /// Player-side result
        outcome: Outcome,
    },
}

impl BattleEvent {
    /// Returns the simulated time the event happened at.
    #[must_use]
    pub const fn at(&self) -> Millis {
        match self {
            Self::Strike { at, .. }
            | Self::Shielded { at, .. }
            | Self::Defeated { at, .. }
            | Self::Healed { at, .. }
            | Self::BuffOpened { at, .. }
            | Self::MeteorLaunched { at, .. }
            | Self::Transformed { at, .. }
            | Self::Summoned { at, .. }
            | Self::Resolved { at, .. } => *at,
        }
    }
}

/// Buffer of events produced since the last drain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Drains every recorded event in emission order.
    pub fn take(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns the recorded events without draining them.
    #[must_use]
    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// Renderer view of one occupied slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    /// Unit identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Archetype tag
    pub archetype: Archetype,
    /// Current health over maximum health
    pub health_fraction: f64,
    /// Alive flag; false for tombstones
    pub alive: bool,
    /// Whether damage is currently discarded
    pub invulnerable: bool,
}

/// Renderer view of the whole battle at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Simulated time
    pub at: Millis,
    /// Lifecycle phase
    pub phase: BattlePhase,
    /// Player slots, `None` for empty
    pub player: [Option<SlotView>; ROSTER_SIZE],
    /// Enemy slots, `None` for empty
    pub enemy: [Option<SlotView>; ROSTER_SIZE],
    /// Whether each side's buff window is open, indexed by side
    pub buffed: [bool; 2],
}

impl BattleSnapshot {
    pub(crate) fn capture(
        rosters: &Rosters,
        at: Millis,
        phase: BattlePhase,
        buffed: [bool; 2],
    ) -> Self {
        Self {
            at,
            phase,
            player: views(rosters, Side::Player, at),
            enemy: views(rosters, Side::Enemy, at),
            buffed,
        }
    }

    /// Returns the slot views of one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &[Option<SlotView>; ROSTER_SIZE] {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }
}

fn views(rosters: &Rosters, side: Side, now: Millis) -> [Option<SlotView>; ROSTER_SIZE] {
    let roster = rosters.side(side);
    std::array::from_fn(|slot| {
        roster.get(slot).map(|unit| SlotView {
            id: unit.id().to_string(),
            name: unit.name().to_string(),
            archetype: unit.archetype(),
            health_fraction: unit.health_fraction(),
            alive: unit.is_alive(),
            invulnerable: unit.is_invulnerable(now),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Combatant, Faction, UnitTemplate};

    #[test]
    fn events_serialize_with_tag() {
        let event = BattleEvent::Resolved {
            at: 2000,
            outcome: Outcome::Win,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "resolved");
        assert_eq!(json["outcome"], "win");
        assert_eq!(event.at(), 2000);
    }

    #[test]
    fn snapshot_marks_empty_slots() {
        let mut rosters = Rosters::default();
        let template =
            UnitTemplate::new("golem", "Golem", Archetype::Guardian, Faction::Human, 80.0, 5.0, 1.0);
        let mut golem = Combatant::from_template(&template, SlotRef::new(Side::Player, 1)).unwrap();
        golem.shield_until(100);
        golem.take_damage(20.0);
        rosters.side_mut(Side::Player).place(1, golem).unwrap();

        let snapshot = BattleSnapshot::capture(&rosters, 50, BattlePhase::Active, [false, true]);
        assert!(snapshot.player[0].is_none());
        let view = snapshot.player[1].as_ref().unwrap();
        assert_eq!(view.health_fraction, 0.75);
        assert!(view.invulnerable);
        assert!(snapshot.side(Side::Enemy).iter().all(Option::is_none));
    }

    #[test]
    fn take_drains_in_order() {
        let mut log = EventLog::new();
        for at in [10, 20, 30] {
            log.push(BattleEvent::BuffOpened {
                at,
                side: Side::Enemy,
                until: at + 5,
            });
        }
        let times: Vec<_> = log.take().iter().map(BattleEvent::at).collect();
        assert_eq!(times, vec![10, 20, 30]);
        assert_eq!(log.len(), 0);
    }
}
