//! Rewards and the persistence collaborator interface.
//!
//! The engine never touches save data. Every side effect on the player's
//! progress is expressed as a [`Report`] queued during the tick and flushed
//! to an [`OutcomeReporter`] afterwards. A failing reporter is logged and
//! ignored; it can never stop a tick or a resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::catalog::LevelId;
use crate::error::ReportError;

// =============================================================================
// Rewards
// =============================================================================

/// Currencies the battle can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Upgrade currency
    LifeStones,
    /// Summon scrolls
    Scrolls,
    /// Rare summon scrolls
    StarScrolls,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LifeStones => write!(f, "life stones"),
            Self::Scrolls => write!(f, "scrolls"),
            Self::StarScrolls => write!(f, "star scrolls"),
        }
    }
}

/// Amounts of each currency granted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardBundle {
    /// Life stones
    pub life_stones: u32,
    /// Summon scrolls
    pub scrolls: u32,
    /// Star scrolls
    pub star_scrolls: u32,
}

impl RewardBundle {
    /// Iterates the non-zero grants of this bundle.
    pub fn grants(&self) -> impl Iterator<Item = (Currency, u32)> {
        [
            (Currency::StarScrolls, self.star_scrolls),
            (Currency::LifeStones, self.life_stones),
            (Currency::Scrolls, self.scrolls),
        ]
        .into_iter()
        .filter(|(_, amount)| *amount > 0)
    }

    /// Returns true if the bundle grants nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.life_stones == 0 && self.scrolls == 0 && self.star_scrolls == 0
    }
}

/// Special first-clear reward of a milestone level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneReward {
    /// Milestone level
    pub level: LevelId,
    /// Bundle granted on first completion instead of the ordinary reward
    pub first_clear: RewardBundle,
}

/// Victory reward rules.
///
/// # Example
///
/// ```
/// use pathheroes_core::catalog::LevelId;
/// use pathheroes_core::outcome::RewardTable;
///
/// let table = RewardTable::default();
/// let level = LevelId::new(2, 3).unwrap();
///
/// let first = table.reward_for(level, true);
/// assert_eq!((first.life_stones, first.scrolls), (5, 1));
///
/// let replay = table.reward_for(level, false);
/// assert_eq!((replay.life_stones, replay.scrolls), (5, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    /// Life stones granted for every win that is not a milestone first clear
    pub base_life_stones: u32,
    /// Extra scrolls for the first clear of an ordinary level
    pub first_clear_scrolls: u32,
    /// Levels with a special first-clear reward
    pub milestones: Vec<MilestoneReward>,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            base_life_stones: 5,
            first_clear_scrolls: 1,
            milestones: vec![
                MilestoneReward {
                    level: LevelId::MIRROR_MATCH,
                    first_clear: RewardBundle {
                        life_stones: 50,
                        scrolls: 0,
                        star_scrolls: 3,
                    },
                },
                MilestoneReward {
                    level: LevelId::FIRST_BOSS,
                    first_clear: RewardBundle {
                        life_stones: 25,
                        scrolls: 0,
                        star_scrolls: 1,
                    },
                },
            ],
        }
    }
}

impl RewardTable {
    /// Returns the bundle for winning `level`.
    #[must_use]
    pub fn reward_for(&self, level: LevelId, first_clear: bool) -> RewardBundle {
        let replay = RewardBundle {
            life_stones: self.base_life_stones,
            ..RewardBundle::default()
        };
        match self.milestone(level) {
            Some(milestone) if first_clear => milestone.first_clear,
            Some(_) => replay,
            None if first_clear => RewardBundle {
                scrolls: self.first_clear_scrolls,
                ..replay
            },
            None => replay,
        }
    }

    /// Returns the milestone entry for `level`, if any.
    #[must_use]
    pub fn milestone(&self, level: LevelId) -> Option<&MilestoneReward> {
        self.milestones.iter().find(|m| m.level == level)
    }
}

// =============================================================================
// Reporter
// =============================================================================

/// A side effect addressed to the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Report {
    /// A player-side combatant killed an enemy.
    Kill,
    /// Add currency to the player's balance.
    Grant {
        /// Currency granted
        currency: Currency,
        /// Amount granted
        amount: u32,
    },
    /// Mark a level as completed.
    MarkCompleted(LevelId),
}

/// Narrow interface to the player's persistent progress.
///
/// Every method defaults to a successful no-op so implementors only override
/// what they store.
pub trait OutcomeReporter {
    /// Counts one monster kill.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the collaborator cannot record it.
    fn record_kill(&mut self) -> Result<(), ReportError> {
        Ok(())
    }

    /// Adds `amount` of `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the collaborator cannot record it.
    fn grant(&mut self, _currency: Currency, _amount: u32) -> Result<(), ReportError> {
        Ok(())
    }

    /// Returns whether `level` was completed before.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the collaborator cannot answer.
    fn is_level_completed(&self, _level: LevelId) -> Result<bool, ReportError> {
        Ok(false)
    }

    /// Marks `level` as completed.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the collaborator cannot record it.
    fn mark_level_completed(&mut self, _level: LevelId) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Reporter that accepts and discards everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopReporter;

impl OutcomeReporter for NoopReporter {}

/// Sends one report, logging a failure instead of returning it.
///
/// Returns true if the collaborator accepted the report.
pub fn deliver<R: OutcomeReporter + ?Sized>(reporter: &mut R, report: Report) -> bool {
    let result = match report {
        Report::Kill => reporter.record_kill(),
        Report::Grant { currency, amount } => reporter.grant(currency, amount),
        Report::MarkCompleted(level) => reporter.mark_level_completed(level),
    };
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(?report, error = %err, "outcome report dropped");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl OutcomeReporter for Broken {
        fn record_kill(&mut self) -> Result<(), ReportError> {
            Err(ReportError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn milestone_first_clear_replaces_base_reward() {
        let table = RewardTable::default();
        let bundle = table.reward_for(LevelId::MIRROR_MATCH, true);
        assert_eq!(
            bundle,
            RewardBundle {
                life_stones: 50,
                scrolls: 0,
                star_scrolls: 3
            }
        );
        let bundle = table.reward_for(LevelId::FIRST_BOSS, true);
        assert_eq!((bundle.life_stones, bundle.star_scrolls), (25, 1));
    }

    #[test]
    fn milestone_replay_grants_base_stones_only() {
        let table = RewardTable::default();
        let bundle = table.reward_for(LevelId::MIRROR_MATCH, false);
        assert_eq!(
            bundle,
            RewardBundle {
                life_stones: 5,
                ..RewardBundle::default()
            }
        );
    }

    #[test]
    fn grants_skip_zero_amounts() {
        let bundle = RewardBundle {
            life_stones: 25,
            scrolls: 0,
            star_scrolls: 1,
        };
        let grants: Vec<_> = bundle.grants().collect();
        assert_eq!(
            grants,
            vec![(Currency::StarScrolls, 1), (Currency::LifeStones, 25)]
        );
        assert!(RewardBundle::default().is_empty());
    }

    #[test]
    fn deliver_swallows_failures() {
        let mut reporter = Broken;
        assert!(!deliver(&mut reporter, Report::Kill));
        assert!(deliver(
            &mut reporter,
            Report::Grant {
                currency: Currency::Scrolls,
                amount: 1
            }
        ));
    }

    #[test]
    fn noop_reporter_accepts_everything() {
        let mut reporter = NoopReporter;
        assert!(deliver(&mut reporter, Report::MarkCompleted(LevelId::FIRST_BOSS)));
        assert_eq!(reporter.is_level_completed(LevelId::FIRST_BOSS), Ok(false));
    }
}
