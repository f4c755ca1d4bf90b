//! In-memory model of the player's progress.
//!
//! [`ProgressLedger`] is the reference [`OutcomeReporter`]: it keeps currency
//! balances, the kill counter and per-level completion flags. The simulator
//! uses it to report what a run would have granted.

use serde::{Deserialize, Serialize};

use crate::catalog::{LevelId, ISLAND_COUNT, LEVELS_PER_ISLAND};
use crate::error::ReportError;
use crate::outcome::{Currency, OutcomeReporter};

/// Upper bound of every currency balance.
pub const BALANCE_CAP: u32 = 999_999;

/// Player progress relevant to battle outcomes.
///
/// # Example
///
/// ```
/// use pathheroes_core::catalog::LevelId;
/// use pathheroes_core::ledger::ProgressLedger;
/// use pathheroes_core::outcome::{Currency, OutcomeReporter};
///
/// let mut ledger = ProgressLedger::new();
/// ledger.grant(Currency::LifeStones, 5).unwrap();
/// ledger.mark_level_completed(LevelId::new(1, 1).unwrap()).unwrap();
///
/// assert_eq!(ledger.balance(Currency::LifeStones), 5);
/// assert_eq!(ledger.completed_on_island(1), 1);
/// assert!(!ledger.is_island_unlocked(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLedger {
    life_stones: u32,
    scrolls: u32,
    star_scrolls: u32,
    monsters_killed: u64,
    completed: [[bool; LEVELS_PER_ISLAND]; ISLAND_COUNT],
}

impl Default for ProgressLedger {
    fn default() -> Self {
        Self {
            life_stones: 0,
            scrolls: 0,
            star_scrolls: 0,
            monsters_killed: 0,
            completed: [[false; LEVELS_PER_ISLAND]; ISLAND_COUNT],
        }
    }
}

impl ProgressLedger {
    /// Creates a ledger with nothing earned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of `currency`.
    #[must_use]
    pub const fn balance(&self, currency: Currency) -> u32 {
        match currency {
            Currency::LifeStones => self.life_stones,
            Currency::Scrolls => self.scrolls,
            Currency::StarScrolls => self.star_scrolls,
        }
    }

    /// Returns the lifetime kill counter.
    #[must_use]
    pub const fn monsters_killed(&self) -> u64 {
        self.monsters_killed
    }

    /// Returns whether `level` is completed.
    #[must_use]
    pub fn is_completed(&self, level: LevelId) -> bool {
        self.completed[level.island_index()][level.level_index()]
    }

    /// Returns how many levels of `island` are completed.
    #[must_use]
    pub fn completed_on_island(&self, island: u8) -> usize {
        island_row(island)
            .and_then(|row| self.completed.get(row))
            .map_or(0, |levels| levels.iter().filter(|done| **done).count())
    }

    /// Returns whether `island` can be entered.
    ///
    /// The first island is always open; every other island opens once all
    /// levels of the previous one are completed.
    #[must_use]
    pub fn is_island_unlocked(&self, island: u8) -> bool {
        match island {
            1 => true,
            _ => island_row(island.wrapping_sub(1))
                .and_then(|row| self.completed.get(row))
                .is_some_and(|levels| levels.iter().all(|done| *done)),
        }
    }

    fn slot_for(&mut self, currency: Currency) -> &mut u32 {
        match currency {
            Currency::LifeStones => &mut self.life_stones,
            Currency::Scrolls => &mut self.scrolls,
            Currency::StarScrolls => &mut self.star_scrolls,
        }
    }
}

fn island_row(island: u8) -> Option<usize> {
    usize::from(island).checked_sub(1).filter(|row| *row < ISLAND_COUNT)
}

impl OutcomeReporter for ProgressLedger {
    fn record_kill(&mut self) -> Result<(), ReportError> {
        self.monsters_killed = self.monsters_killed.saturating_add(1);
        Ok(())
    }

    fn grant(&mut self, currency: Currency, amount: u32) -> Result<(), ReportError> {
        let balance = self.slot_for(currency);
        *balance = balance.saturating_add(amount).min(BALANCE_CAP);
        Ok(())
    }

    fn is_level_completed(&self, level: LevelId) -> Result<bool, ReportError> {
        Ok(self.is_completed(level))
    }

    fn mark_level_completed(&mut self, level: LevelId) -> Result<(), ReportError> {
        self.completed[level.island_index()][level.level_index()] = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_are_capped() {
        let mut ledger = ProgressLedger::new();
        ledger.grant(Currency::Scrolls, BALANCE_CAP - 1).unwrap();
        ledger.grant(Currency::Scrolls, 10).unwrap();
        assert_eq!(ledger.balance(Currency::Scrolls), BALANCE_CAP);
        assert_eq!(ledger.balance(Currency::StarScrolls), 0);
    }

    #[test]
    fn island_unlocks_after_full_clear() {
        let mut ledger = ProgressLedger::new();
        for level in 1..=10 {
            assert!(!ledger.is_island_unlocked(2));
            ledger
                .mark_level_completed(LevelId::new(1, level).unwrap())
                .unwrap();
        }
        assert!(ledger.is_island_unlocked(2));
        assert!(!ledger.is_island_unlocked(3));
    }

    #[test]
    fn out_of_range_islands_are_locked() {
        let ledger = ProgressLedger::new();
        assert!(!ledger.is_island_unlocked(0));
        assert!(!ledger.is_island_unlocked(42));
        assert_eq!(ledger.completed_on_island(0), 0);
    }

    #[test]
    fn kills_accumulate() {
        let mut ledger = ProgressLedger::new();
        ledger.record_kill().unwrap();
        ledger.record_kill().unwrap();
        assert_eq!(ledger.monsters_killed(), 2);
    }

    #[test]
    fn ledger_serializes() {
        let mut ledger = ProgressLedger::new();
        ledger.grant(Currency::LifeStones, 7).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let back: ProgressLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
