//! Ability descriptors resolved from a combatant's archetype.
//!
//! An archetype maps to a fixed [`AbilitySet`] when the combatant is
//! created. The dispatcher iterates the set as data instead of checking
//! unit identities at strike time.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Special abilities a combatant carries on top of its basic strike.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AbilitySet: u16 {
        /// Periodic double-damage hit on the nearest target.
        const BONUS_STRIKE = 1 << 0;
        /// Periodic delayed triple-damage hit on a random target.
        const HEAVY_STRIKE = 1 << 1;
        /// Periodic double-damage hit on every living opponent.
        const ALL_TARGET_STRIKE = 1 << 2;
        /// Periodic chance to fully restore own health.
        const SELF_HEAL = 1 << 3;
        /// Basic strike hits several distinct random targets.
        const MULTI_HIT = 1 << 4;
        /// Keeps the side's damage buff window pulsing while alive.
        const BUFF_EMITTER = 1 << 5;
        /// Periodically inserts a summoned unit into an empty slot.
        const SUMMON = 1 << 6;
        /// Periodic fixed-damage hit on a random target.
        const SCATTER_STRIKE = 1 << 7;
        /// Spawns an ally into an empty slot after each kill.
        const SPAWN_ON_KILL = 1 << 8;
        /// Ignores all damage for a short window after spawning.
        const SPAWN_SHIELD = 1 << 9;
    }
}

/// Timed actions a combatant can own in the scheduler.
///
/// The declaration order is the order in which a single unit's due timers
/// run within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Regular attack on the attack-rate cadence.
    BasicStrike,
    /// Double-damage hit on the nearest target.
    BonusStrike,
    /// Launch of a delayed heavy projectile.
    HeavyStrike,
    /// Hit on every living opponent.
    AllTargetStrike,
    /// Fixed-damage hit on a random opponent.
    ScatterStrike,
    /// Insertion of a summoned ally.
    Summon,
    /// Full-heal roll.
    SelfHeal,
}

impl AbilityKind {
    /// All timed kinds in scan order.
    pub const ALL: [Self; 7] = [
        Self::BasicStrike,
        Self::BonusStrike,
        Self::HeavyStrike,
        Self::AllTargetStrike,
        Self::ScatterStrike,
        Self::Summon,
        Self::SelfHeal,
    ];

    /// Returns the ability flag that enables this timer, or `None` for the
    /// basic strike which every combatant owns.
    #[must_use]
    pub const fn required_flag(self) -> Option<AbilitySet> {
        match self {
            Self::BasicStrike => None,
            Self::BonusStrike => Some(AbilitySet::BONUS_STRIKE),
            Self::HeavyStrike => Some(AbilitySet::HEAVY_STRIKE),
            Self::AllTargetStrike => Some(AbilitySet::ALL_TARGET_STRIKE),
            Self::ScatterStrike => Some(AbilitySet::SCATTER_STRIKE),
            Self::Summon => Some(AbilitySet::SUMMON),
            Self::SelfHeal => Some(AbilitySet::SELF_HEAL),
        }
    }
}

impl AbilitySet {
    /// Returns the timed ability kinds this set schedules, in scan order.
    ///
    /// # Example
    ///
    /// ```
    /// use pathheroes_core::unit::{AbilityKind, AbilitySet};
    ///
    /// let kinds: Vec<_> = (AbilitySet::BONUS_STRIKE | AbilitySet::SPAWN_SHIELD)
    ///     .timed_kinds()
    ///     .collect();
    /// assert_eq!(kinds, vec![AbilityKind::BasicStrike, AbilityKind::BonusStrike]);
    /// ```
    pub fn timed_kinds(self) -> impl Iterator<Item = AbilityKind> {
        AbilityKind::ALL
            .into_iter()
            .filter(move |kind| kind.required_flag().map_or(true, |flag| self.contains(flag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_still_schedules_basic_strike() {
        let kinds: Vec<_> = AbilitySet::empty().timed_kinds().collect();
        assert_eq!(kinds, vec![AbilityKind::BasicStrike]);
    }

    #[test]
    fn passive_flags_schedule_nothing_extra() {
        let passive = AbilitySet::MULTI_HIT
            | AbilitySet::BUFF_EMITTER
            | AbilitySet::SPAWN_ON_KILL
            | AbilitySet::SPAWN_SHIELD;
        assert_eq!(passive.timed_kinds().count(), 1);
    }

    #[test]
    fn timed_kinds_follow_scan_order() {
        let set = AbilitySet::SELF_HEAL | AbilitySet::HEAVY_STRIKE | AbilitySet::BONUS_STRIKE;
        let kinds: Vec<_> = set.timed_kinds().collect();
        assert_eq!(
            kinds,
            vec![
                AbilityKind::BasicStrike,
                AbilityKind::BonusStrike,
                AbilityKind::HeavyStrike,
                AbilityKind::SelfHeal,
            ]
        );
    }

    #[test]
    fn ability_set_round_trips_through_json() {
        let set = AbilitySet::SUMMON | AbilitySet::SPAWN_SHIELD;
        let json = serde_json::to_string(&set).unwrap();
        let back: AbilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
