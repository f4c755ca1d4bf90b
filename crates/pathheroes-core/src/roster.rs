//! Fixed-size slot storage for both sides of a battle.
//!
//! A [`Roster`] holds five slots. A slot is either empty or holds one
//! [`Combatant`]; the slot index is the combatant's identity for its whole
//! lifetime. Dead combatants stay in place as tombstones until the battle
//! ends, so they are never "empty" for placement purposes.
//!
//! # Example
//!
//! ```
//! use pathheroes_core::roster::Roster;
//! use pathheroes_core::unit::{Archetype, Combatant, Faction, Side, SlotRef, UnitTemplate};
//!
//! let mut roster = Roster::new(Side::Player);
//! let template = UnitTemplate::new("knight", "Knight", Archetype::Striker, Faction::Human, 100.0, 10.0, 1.0);
//! let knight = Combatant::from_template(&template, SlotRef::new(Side::Player, 1)).unwrap();
//! roster.place(1, knight).unwrap();
//!
//! assert_eq!(roster.living_slots().collect::<Vec<_>>(), vec![1]);
//! assert_eq!(roster.empty_slots().len(), 4);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, SetupError};
use crate::unit::{Combatant, Side, SlotRef};

/// Number of slots per side.
pub const ROSTER_SIZE: usize = 5;

/// Alive mask of a roster, indexed by slot.
pub type AliveMask = [bool; ROSTER_SIZE];

/// One side's slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    side: Side,
    slots: [Option<Combatant>; ROSTER_SIZE],
}

impl Roster {
    /// Creates an empty roster for `side`.
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            slots: Default::default(),
        }
    }

    /// Returns the owning side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns the combatant in `slot`, living or dead.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Combatant> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Returns a mutable reference to the combatant in `slot`.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Combatant> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Places a combatant into an empty slot.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::SlotOccupied`] if the slot holds a combatant or
    /// tombstone, and [`BattleError::EmptySlot`] if the index is out of range.
    pub fn place(&mut self, slot: usize, combatant: Combatant) -> Result<(), BattleError> {
        let at = SlotRef::new(self.side, slot);
        match self.slots.get_mut(slot) {
            None => Err(BattleError::EmptySlot(at)),
            Some(Some(_)) => Err(BattleError::SlotOccupied(at)),
            Some(entry) => {
                *entry = Some(combatant);
                Ok(())
            }
        }
    }

    /// Clears a slot during setup.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::SlotOutOfRange`] for an index past the roster.
    pub fn clear(&mut self, slot: usize) -> Result<Option<Combatant>, SetupError> {
        self.slots
            .get_mut(slot)
            .map(Option::take)
            .ok_or(SetupError::SlotOutOfRange(slot))
    }

    /// Returns which slots hold a living combatant.
    #[must_use]
    pub fn alive_mask(&self) -> AliveMask {
        let mut mask = [false; ROSTER_SIZE];
        for (alive, slot) in mask.iter_mut().zip(&self.slots) {
            *alive = slot.as_ref().is_some_and(Combatant::is_alive);
        }
        mask
    }

    /// Iterates the indices of living combatants in ascending order.
    pub fn living_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(Combatant::is_alive))
            .map(|(index, _)| index)
    }

    /// Returns the indices of slots that have never held a combatant.
    #[must_use]
    pub fn empty_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns true if any combatant on this side is alive.
    #[must_use]
    pub fn any_alive(&self) -> bool {
        self.living_slots().next().is_some()
    }

    /// Iterates every occupied slot, living or dead.
    pub fn occupants(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.slots.iter().flatten()
    }
}

/// Both rosters, indexed by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rosters {
    sides: [Roster; 2],
}

impl Default for Rosters {
    fn default() -> Self {
        Self {
            sides: [Roster::new(Side::Player), Roster::new(Side::Enemy)],
        }
    }
}

impl Rosters {
    /// Returns one side's roster.
    #[must_use]
    pub fn side(&self, side: Side) -> &Roster {
        &self.sides[side.index()]
    }

    /// Returns one side's roster mutably.
    pub fn side_mut(&mut self, side: Side) -> &mut Roster {
        &mut self.sides[side.index()]
    }

    /// Looks up a combatant by slot reference.
    #[must_use]
    pub fn get(&self, at: SlotRef) -> Option<&Combatant> {
        self.side(at.side).get(at.slot)
    }

    /// Looks up a combatant mutably by slot reference.
    pub fn get_mut(&mut self, at: SlotRef) -> Option<&mut Combatant> {
        self.side_mut(at.side).get_mut(at.slot)
    }

    /// Iterates every occupied slot in scan order.
    pub fn occupants(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.sides.iter().flat_map(Roster::occupants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Archetype, Faction, UnitTemplate};

    fn unit(side: Side, slot: usize) -> Combatant {
        let template =
            UnitTemplate::new("slime", "Slime", Archetype::Monster, Faction::Monster, 20.0, 2.0, 1.0);
        Combatant::from_template(&template, SlotRef::new(side, slot)).unwrap()
    }

    #[test]
    fn place_rejects_occupied_slot() {
        let mut roster = Roster::new(Side::Enemy);
        roster.place(0, unit(Side::Enemy, 0)).unwrap();
        let err = roster.place(0, unit(Side::Enemy, 0)).unwrap_err();
        assert_eq!(err, BattleError::SlotOccupied(SlotRef::new(Side::Enemy, 0)));
    }

    #[test]
    fn place_rejects_out_of_range() {
        let mut roster = Roster::new(Side::Player);
        assert!(roster.place(ROSTER_SIZE, unit(Side::Player, 0)).is_err());
    }

    #[test]
    fn tombstones_are_not_empty() {
        let mut roster = Roster::new(Side::Enemy);
        roster.place(2, unit(Side::Enemy, 2)).unwrap();
        roster.get_mut(2).unwrap().take_damage(100.0);

        assert!(!roster.any_alive());
        assert_eq!(roster.empty_slots(), vec![0, 1, 3, 4]);
        assert_eq!(roster.alive_mask(), [false; ROSTER_SIZE]);
    }

    #[test]
    fn alive_mask_tracks_deaths() {
        let mut roster = Roster::new(Side::Player);
        roster.place(0, unit(Side::Player, 0)).unwrap();
        roster.place(3, unit(Side::Player, 3)).unwrap();
        assert_eq!(roster.alive_mask(), [true, false, false, true, false]);

        roster.get_mut(0).unwrap().take_damage(20.0);
        assert_eq!(roster.alive_mask(), [false, false, false, true, false]);
    }

    #[test]
    fn rosters_lookup_by_slot_ref() {
        let mut rosters = Rosters::default();
        rosters.side_mut(Side::Enemy).place(4, unit(Side::Enemy, 4)).unwrap();
        assert!(rosters.get(SlotRef::new(Side::Enemy, 4)).is_some());
        assert!(rosters.get(SlotRef::new(Side::Player, 4)).is_none());
        assert_eq!(rosters.occupants().count(), 1);
    }

    #[test]
    fn clear_reports_bad_index() {
        let mut roster = Roster::new(Side::Player);
        assert_eq!(roster.clear(7), Err(SetupError::SlotOutOfRange(7)));
    }
}
